//! Waveform Cache Port - 调用方使用的波形缓存接口
//!
//! 所有操作都不向调用方抛错：源不可读、解码失败、持久化失败都退化为空结果。

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::domain::{MinMaxPair, TrimRange};

/// 裁剪更新请求
#[derive(Debug, Clone)]
pub struct TrimUpdate {
    /// 裁剪前的文件
    pub old_path: PathBuf,
    /// 裁剪后生成的新文件
    pub new_path: PathBuf,
    /// 保留的时间区间
    pub range: TrimRange,
    /// 目标点数
    pub target_count: usize,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub indexed_sources: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub extraction_count: u64,
    pub trim_reuse_count: u64,
    pub eviction_count: u64,
    pub memo_hit_count: u64,
    pub snapshot_writes: u64,
}

/// Waveform Cache Port
#[async_trait]
pub trait WaveformCachePort: Send + Sync {
    /// 包络，重采样到 `target_count` 个点
    async fn samples(&self, path: PathBuf, target_count: usize) -> Vec<f32>;

    /// min/max 对，重采样到 `target_count` 个点
    async fn min_max_samples(&self, path: PathBuf, target_count: usize) -> Vec<MinMaxPair>;

    /// 裁剪后的包络（优先复用旧文件缓存）
    async fn samples_after_trim(&self, update: TrimUpdate) -> Vec<f32>;

    /// 裁剪后的 min/max（优先复用旧文件缓存）
    async fn min_max_samples_after_trim(&self, update: TrimUpdate) -> Vec<MinMaxPair>;

    /// 清除某个源的所有缓存
    async fn clear_cache(&self, path: PathBuf);

    /// 清空所有缓存
    async fn clear_all_cache(&self);

    /// 立即写出待处理的快照
    async fn flush(&self);

    /// 统计信息
    async fn stats(&self) -> CacheStats;
}
