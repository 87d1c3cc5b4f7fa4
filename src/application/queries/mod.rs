//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：按分辨率读取波形（缓存未命中时由缓存内部完成提取）

mod waveform_queries;

pub mod handlers;

pub use waveform_queries::*;
