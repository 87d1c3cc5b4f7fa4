//! Waveform Context - 波形限界上下文
//!
//! 职责:
//! - 内容指纹（source identity → cache key）
//! - 分桶归约（envelope / min-max 两种表示）
//! - 任意分辨率重采样
//! - 裁剪后的增量切片与重新归一化
//! - 历史缓存 key 格式迁移

mod extraction;
mod fingerprint;
mod key_migration;
mod resample;
mod trim;
mod value_objects;

pub use extraction::{
    normalize_envelope, normalize_min_max, BucketReducer, ExtractedSeries,
    DEFAULT_CHUNK_FRAMES, DEFAULT_STORAGE_RESOLUTION, MIN_PEAK,
};
pub use fingerprint::digest_hex;
pub use key_migration::PersistedKey;
pub use resample::{resample, Resample, ResampleMemo};
pub use trim::{trim_envelope, trim_min_max, TrimRange};
pub use value_objects::{format_timestamp, CacheKey, MinMaxPair, SeriesKind, SourceIdentity};
