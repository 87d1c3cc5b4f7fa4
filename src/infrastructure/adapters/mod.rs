//! Adapters - 外部依赖适配器
//!
//! - Decoder: 基于 symphonia 的音频解码

pub mod decoder;

pub use decoder::SymphoniaDecoder;
