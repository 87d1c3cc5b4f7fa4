//! Audio Decoder Port - 解码器边界
//!
//! 提取流水线只需要三样东西：总帧数、采样率、按块读取单声道 f32 帧。
//! 具体实现在 infrastructure/adapters/decoder（基于 symphonia）。

use std::path::Path;
use thiserror::Error;

/// 解码错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open source: {0}")]
    OpenFailed(String),

    #[error("No audio track found")]
    NoTrack,

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::IoError(err.to_string())
    }
}

/// 已打开的音频流
///
/// 所有帧都已经混成单声道。
pub trait FrameReader: Send {
    /// 总帧数
    fn total_frames(&self) -> u64;

    /// 处理采样率（Hz）
    fn sample_rate(&self) -> u32;

    /// 读取至多 `max_frames` 帧追加到 `buf`
    ///
    /// 返回实际读取的帧数，0 表示流结束。
    fn read_frames(&mut self, buf: &mut Vec<f32>, max_frames: usize) -> Result<usize, DecodeError>;
}

/// Audio Decoder Port
pub trait AudioDecoderPort: Send + Sync {
    /// 打开一个音频源
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, DecodeError>;
}
