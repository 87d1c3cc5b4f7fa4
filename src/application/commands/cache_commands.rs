//! Cache Commands - 缓存命令

use std::path::PathBuf;

use crate::domain::{MinMaxPair, SeriesKind};

/// 裁剪更新命令
///
/// 编辑操作生成新文件之后调用，新文件的波形优先从旧文件缓存中切出。
#[derive(Debug, Clone)]
pub struct TrimUpdateCommand {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// 原始时长（秒）
    pub original_duration: f64,
    /// 保留区间起点（秒）
    pub trim_start: f64,
    /// 保留区间终点（秒）
    pub trim_end: f64,
    pub count: usize,
    pub kind: SeriesKind,
}

/// 裁剪更新响应
#[derive(Debug, Clone, PartialEq)]
pub enum TrimUpdateResponse {
    Envelope(Vec<f32>),
    MinMax(Vec<MinMaxPair>),
}

impl TrimUpdateResponse {
    pub fn len(&self) -> usize {
        match self {
            TrimUpdateResponse::Envelope(samples) => samples.len(),
            TrimUpdateResponse::MinMax(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 清除某个源的缓存
#[derive(Debug, Clone)]
pub struct ClearCacheCommand {
    pub path: PathBuf,
}

/// 清空所有缓存
#[derive(Debug, Clone, Default)]
pub struct ClearAllCacheCommand;
