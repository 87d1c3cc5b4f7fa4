//! Memory Layer - 内存实现
//!
//! WaveformStore: 波形缓存表 + LRU + 反向索引

mod waveform_store;

pub use waveform_store::{WaveformStore, DEFAULT_CAPACITY};
