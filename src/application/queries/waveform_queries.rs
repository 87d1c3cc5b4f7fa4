//! Waveform Queries - 波形查询

use std::path::PathBuf;

use crate::domain::MinMaxPair;

/// 获取包络
#[derive(Debug, Clone)]
pub struct GetSamplesQuery {
    pub path: PathBuf,
    pub count: usize,
}

/// 获取 min/max 对
#[derive(Debug, Clone)]
pub struct GetMinMaxSamplesQuery {
    pub path: PathBuf,
    pub count: usize,
}

/// 包络响应
#[derive(Debug, Clone)]
pub struct SamplesResponse {
    pub samples: Vec<f32>,
}

/// min/max 响应
#[derive(Debug, Clone)]
pub struct MinMaxSamplesResponse {
    pub samples: Vec<MinMaxPair>,
}
