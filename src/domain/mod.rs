//! Domain Layer - 领域层
//!
//! 只有一个限界上下文:
//! - Waveform Context: 波形采样、指纹、重采样与裁剪更新
//!
//! 领域层不依赖 tokio，也不依赖任何端口，所有函数都是同步、可单测的纯逻辑。

pub mod waveform;

pub use waveform::{
    digest_hex, resample, CacheKey, ExtractedSeries, MinMaxPair, ResampleMemo, SeriesKind,
    SourceIdentity, TrimRange,
};
