//! Symphonia Decoder - 基于 symphonia 的流式解码器
//!
//! 按 packet 解码，混成单声道后按调用方要求的帧数分块输出，
//! 任何时刻只持有一个 packet 的数据。

use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError, FrameReader};

/// 帧数未知时计数用的块大小
const COUNT_CHUNK_FRAMES: usize = 65_536;

/// Symphonia 解码器
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 容器没有声明帧数时，先完整解码一遍计数（内存仍然有界）
    fn count_frames(path: &Path) -> Result<u64, DecodeError> {
        let mut reader = SymphoniaFrameReader::open(path)?;
        let mut scratch = Vec::with_capacity(COUNT_CHUNK_FRAMES);
        let mut total = 0u64;

        loop {
            scratch.clear();
            let read = reader.read_frames(&mut scratch, COUNT_CHUNK_FRAMES)?;
            if read == 0 {
                break;
            }
            total += read as u64;
        }

        Ok(total)
    }
}

impl AudioDecoderPort for SymphoniaDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, DecodeError> {
        let mut reader = SymphoniaFrameReader::open(path)?;

        if reader.declared_frames.is_none() {
            let counted = Self::count_frames(path)?;
            tracing::debug!(path = %path.display(), frames = counted, "Frame count from decode pass");
            reader.declared_frames = Some(counted);
        }

        Ok(Box::new(reader))
    }
}

/// 单个已打开的音频流
struct SymphoniaFrameReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    declared_frames: Option<u64>,
    sample_buf: Option<SampleBuffer<f32>>,
    /// 当前 packet 混音后的单声道帧
    pending: Vec<f32>,
    pending_pos: usize,
    finished: bool,
}

impl SymphoniaFrameReader {
    fn open(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)
            .map_err(|e| DecodeError::OpenFailed(format!("{}: {}", path.display(), e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::OpenFailed(format!("Probe failed: {}", e)))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoTrack)?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let declared_frames = track.codec_params.n_frames;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedCodec(e.to_string()))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            declared_frames,
            sample_buf: None,
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
        })
    }

    /// 解码下一个属于本轨道的 packet 到 pending，流结束返回 false
    fn decode_next_packet(&mut self) -> Result<bool, DecodeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => {
                    return Err(DecodeError::DecodingError(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(DecodeError::DecodingError(e.to_string())),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            let channels = spec.channels.count().max(1);
            if frames == 0 {
                continue;
            }

            let needs_alloc = self
                .sample_buf
                .as_ref()
                .map_or(true, |buf| buf.capacity() < frames * channels);
            if needs_alloc {
                self.sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            let Some(sample_buf) = self.sample_buf.as_mut() else {
                continue;
            };
            sample_buf.copy_interleaved_ref(decoded);

            let interleaved = &sample_buf.samples()[..frames * channels];
            self.pending.clear();
            self.pending.extend(
                interleaved
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
            self.pending_pos = 0;
            return Ok(true);
        }
    }
}

impl FrameReader for SymphoniaFrameReader {
    fn total_frames(&self) -> u64 {
        self.declared_frames.unwrap_or(0)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(&mut self, buf: &mut Vec<f32>, max_frames: usize) -> Result<usize, DecodeError> {
        let mut read = 0;

        while read < max_frames {
            if self.pending_pos >= self.pending.len() {
                if self.finished || !self.decode_next_packet()? {
                    self.finished = true;
                    break;
                }
                continue;
            }

            let take = (self.pending.len() - self.pending_pos).min(max_frames - read);
            buf.extend_from_slice(&self.pending[self.pending_pos..self.pending_pos + take]);
            self.pending_pos += take;
            read += take;
        }

        Ok(read)
    }
}
