//! Persistence Layer - 数据持久化
//!
//! 波形快照的 JSON 文件存储

pub mod json;

pub use self::json::JsonSnapshotStore;
