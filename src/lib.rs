//! wavecache - 波形采样缓存与重采样服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Waveform Context: 指纹、分桶归约、重采样、裁剪切片、历史 key 迁移
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioDecoder, SnapshotStore, WaveformCache）
//! - Commands: 裁剪更新、清除缓存
//! - Queries: 包络、min/max、统计
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Memory: WaveformStore（LRU + 反向索引）
//! - Worker: 单写者 cache actor + 提取 worker + 延迟写
//! - Persistence: JSON 快照
//! - Adapters: Symphonia 解码器

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
