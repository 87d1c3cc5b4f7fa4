//! Snapshot Store Port - 波形缓存快照持久化
//!
//! 两个独立的 key → 数组 文档：envelope 与 min/max。
//! 快照里的 key 是原始字符串，可能是历史格式，迁移在加载后由调用方完成。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::MinMaxPair;

/// 快照错误
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::SerializationError(err.to_string())
    }
}

/// 两张缓存表的不可变副本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub envelopes: HashMap<String, Vec<f32>>,
    pub min_max: HashMap<String, Vec<MinMaxPair>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty() && self.min_max.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.envelopes.len().max(self.min_max.len())
    }
}

/// Snapshot Store Port
///
/// 同步接口：调用方负责把它放到阻塞线程池里执行。
pub trait SnapshotStorePort: Send + Sync {
    /// 读取快照；文件不存在时返回空快照
    fn load(&self) -> Result<Snapshot, SnapshotError>;

    /// 覆盖写入快照
    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}
