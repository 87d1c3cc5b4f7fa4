//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{TrimUpdateCommand, TrimUpdateResponse};
use crate::domain::{MinMaxPair, SeriesKind};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Waveform DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SamplesRequest {
    pub path: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SamplesData {
    /// 实际返回的点数；源不可读时为 0
    pub count: usize,
    pub samples: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct MinMaxData {
    pub count: usize,
    pub samples: Vec<MinMaxPair>,
}

#[derive(Debug, Deserialize)]
pub struct TrimRequest {
    pub old_path: String,
    pub new_path: String,
    pub original_duration: f64,
    pub trim_start: f64,
    pub trim_end: f64,
    pub count: usize,
    #[serde(default)]
    pub kind: SeriesKind,
}

impl From<TrimRequest> for TrimUpdateCommand {
    fn from(req: TrimRequest) -> Self {
        Self {
            old_path: req.old_path.into(),
            new_path: req.new_path.into(),
            original_duration: req.original_duration,
            trim_start: req.trim_start,
            trim_end: req.trim_end,
            count: req.count,
            kind: req.kind,
        }
    }
}

/// `{"kind": "envelope" | "minmax", "samples": [...]}`
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "samples", rename_all = "lowercase")]
pub enum TrimData {
    Envelope(Vec<f32>),
    MinMax(Vec<MinMaxPair>),
}

impl From<TrimUpdateResponse> for TrimData {
    fn from(resp: TrimUpdateResponse) -> Self {
        match resp {
            TrimUpdateResponse::Envelope(samples) => TrimData::Envelope(samples),
            TrimUpdateResponse::MinMax(samples) => TrimData::MinMax(samples),
        }
    }
}

// ============================================================================
// Cache DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ClearCacheRequest {
    pub path: String,
}
