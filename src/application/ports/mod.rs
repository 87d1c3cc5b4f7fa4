//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_decoder;
mod snapshot_store;
mod waveform_cache;

pub use audio_decoder::{AudioDecoderPort, DecodeError, FrameReader};
pub use snapshot_store::{Snapshot, SnapshotError, SnapshotStorePort};
pub use waveform_cache::{CacheStats, TrimUpdate, WaveformCachePort};
