//! Extraction Worker - 流式提取
//!
//! 解码是阻塞 IO + CPU 密集计算，必须离开 actor 所在的执行上下文：
//! 这里用 spawn_blocking 执行，semaphore 控制同时解码的文件数。
//! 提取过程不接触任何共享可变状态，结果交回 actor 再写入缓存。

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::application::ports::{AudioDecoderPort, DecodeError, FrameReader};
use crate::domain::waveform::{BucketReducer, DEFAULT_CHUNK_FRAMES, DEFAULT_STORAGE_RESOLUTION};
use crate::domain::ExtractedSeries;

/// 提取参数
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings {
    /// 存储分辨率上限（桶数）
    pub storage_resolution: usize,
    /// 每次读取的帧数
    pub chunk_frames: usize,
    /// 最大并发提取数
    pub max_concurrent: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            storage_resolution: DEFAULT_STORAGE_RESOLUTION,
            chunk_frames: DEFAULT_CHUNK_FRAMES,
            max_concurrent: 2,
        }
    }
}

/// 从已打开的流中提取两种序列
///
/// 零长度源返回 `Ok(None)`。内存占用 = 一个 chunk 缓冲 + 桶数组。
pub fn extract_from_reader(
    reader: &mut dyn FrameReader,
    settings: &ExtractionSettings,
) -> Result<Option<ExtractedSeries>, DecodeError> {
    let Some(mut reducer) = BucketReducer::new(reader.total_frames(), settings.storage_resolution)
    else {
        return Ok(None);
    };

    let chunk_frames = settings.chunk_frames.max(1);
    let mut chunk = Vec::with_capacity(chunk_frames);

    loop {
        chunk.clear();
        let read = reader.read_frames(&mut chunk, chunk_frames)?;
        if read == 0 {
            break;
        }
        reducer.fold_chunk(&chunk);
    }

    if reducer.frames_seen() == 0 {
        return Ok(None);
    }

    Ok(Some(reducer.finish()))
}

/// 提取 Worker
#[derive(Clone)]
pub struct ExtractionWorker {
    decoder: Arc<dyn AudioDecoderPort>,
    settings: ExtractionSettings,
    permits: Arc<Semaphore>,
}

impl ExtractionWorker {
    pub fn new(decoder: Arc<dyn AudioDecoderPort>, settings: ExtractionSettings) -> Self {
        Self {
            decoder,
            permits: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            settings,
        }
    }

    /// 提取一个源
    ///
    /// 失败策略：打不开、解码出错、零长度都返回 None，调用方视为“没有波形”，
    /// 不是错误。
    pub async fn extract(&self, path: PathBuf) -> Option<ExtractedSeries> {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!("Extraction semaphore closed");
                return None;
            }
        };

        let decoder = self.decoder.clone();
        let settings = self.settings;
        let task_path = path.clone();

        match tokio::task::spawn_blocking(move || {
            Self::extract_blocking(decoder.as_ref(), &task_path, &settings)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Extraction task panicked");
                None
            }
        }
    }

    fn extract_blocking(
        decoder: &dyn AudioDecoderPort,
        path: &Path,
        settings: &ExtractionSettings,
    ) -> Option<ExtractedSeries> {
        let mut reader = match decoder.open(path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Source cannot be opened, no waveform");
                return None;
            }
        };

        let sample_rate = reader.sample_rate();
        let total_frames = reader.total_frames();

        match extract_from_reader(reader.as_mut(), settings) {
            Ok(Some(series)) => {
                tracing::debug!(
                    path = %path.display(),
                    total_frames = total_frames,
                    sample_rate = sample_rate,
                    buckets = series.envelope.len(),
                    "Waveform extracted"
                );
                Some(series)
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "Empty source, no waveform");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Extraction failed, no waveform");
                None
            }
        }
    }
}
