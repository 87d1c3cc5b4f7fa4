//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AudioDecoder、SnapshotStore、WaveformCache）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod limits;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{ClearAllCacheHandler, ClearCacheHandler, TrimUpdateHandler},
    ClearAllCacheCommand, ClearCacheCommand, TrimUpdateCommand, TrimUpdateResponse,
};

pub use error::ApplicationError;
pub use limits::RequestLimits;

pub use ports::{
    // Decoder
    AudioDecoderPort,
    DecodeError,
    FrameReader,
    // Snapshot store
    Snapshot,
    SnapshotError,
    SnapshotStorePort,
    // Waveform cache
    CacheStats,
    TrimUpdate,
    WaveformCachePort,
};

pub use queries::{
    handlers::{GetCacheStatsHandler, GetMinMaxSamplesHandler, GetSamplesHandler},
    GetMinMaxSamplesQuery, GetSamplesQuery, MinMaxSamplesResponse, SamplesResponse,
};
