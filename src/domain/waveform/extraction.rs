//! Streaming Extraction - 分桶归约
//!
//! 解码循环在 worker 里跑，这里只负责把一块块单声道帧折叠进固定数量的桶，
//! 最后做归一化。内存占用 = 当前 chunk + 桶数组，与文件长度无关。

use super::value_objects::MinMaxPair;

/// 存储分辨率上限（桶数）
pub const DEFAULT_STORAGE_RESOLUTION: usize = 1000;

/// 每次从解码器读取的帧数
pub const DEFAULT_CHUNK_FRAMES: usize = 32_768;

/// min/max 归一化的峰值下限，静音时避免除零
pub const MIN_PEAK: f32 = 0.001;

/// 一次提取的结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedSeries {
    pub envelope: Vec<f32>,
    pub min_max: Vec<MinMaxPair>,
}

/// 分桶归约器
///
/// `bucket = min(resolution - 1, global_index / samples_per_bucket)`
#[derive(Debug)]
pub struct BucketReducer {
    samples_per_bucket: u64,
    frames_seen: u64,
    envelope: Vec<f32>,
    min_max: Vec<MinMaxPair>,
}

impl BucketReducer {
    /// 总帧数为 0 时没有可提取的内容，返回 None
    pub fn new(total_frames: u64, max_resolution: usize) -> Option<Self> {
        if total_frames == 0 || max_resolution == 0 {
            return None;
        }

        let resolution = (max_resolution as u64).min(total_frames) as usize;
        let samples_per_bucket = (total_frames / resolution as u64).max(1);

        Some(Self {
            samples_per_bucket,
            frames_seen: 0,
            envelope: vec![0.0; resolution],
            min_max: vec![MinMaxPair::new(f32::INFINITY, f32::NEG_INFINITY); resolution],
        })
    }

    pub fn resolution(&self) -> usize {
        self.envelope.len()
    }

    pub fn samples_per_bucket(&self) -> u64 {
        self.samples_per_bucket
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// 折叠一个 chunk，chunk 内的帧紧接在之前所有帧之后
    pub fn fold_chunk(&mut self, chunk: &[f32]) {
        let last = self.envelope.len() - 1;

        for (offset, &sample) in chunk.iter().enumerate() {
            let global_index = self.frames_seen + offset as u64;
            let bucket = ((global_index / self.samples_per_bucket) as usize).min(last);

            let magnitude = sample.abs();
            if magnitude > self.envelope[bucket] {
                self.envelope[bucket] = magnitude;
            }

            let pair = &mut self.min_max[bucket];
            if sample < pair.min {
                pair.min = sample;
            }
            if sample > pair.max {
                pair.max = sample;
            }
        }

        self.frames_seen += chunk.len() as u64;
    }

    /// 收尾：未触达的桶置零，然后两种序列各自归一化
    pub fn finish(self) -> ExtractedSeries {
        let mut envelope = self.envelope;
        let mut min_max: Vec<MinMaxPair> = self
            .min_max
            .into_iter()
            .map(|pair| {
                if pair.min > pair.max {
                    MinMaxPair::default()
                } else {
                    pair
                }
            })
            .collect();

        normalize_envelope(&mut envelope);
        normalize_min_max(&mut min_max);

        ExtractedSeries { envelope, min_max }
    }
}

/// 按序列自身最大值归一化；最大值为 0 时保持全零
pub fn normalize_envelope(values: &mut [f32]) {
    let max = values.iter().copied().fold(0.0_f32, f32::max);
    if max > 0.0 {
        for value in values.iter_mut() {
            *value /= max;
        }
    }
}

/// 按整个序列的绝对值峰值归一化，峰值有 MIN_PEAK 下限
pub fn normalize_min_max(pairs: &mut [MinMaxPair]) {
    let peak = pairs
        .iter()
        .map(MinMaxPair::peak)
        .fold(0.0_f32, f32::max)
        .max(MIN_PEAK);

    for pair in pairs.iter_mut() {
        pair.min /= peak;
        pair.max /= peak;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(samples: &[f32], resolution: usize, chunk: usize) -> ExtractedSeries {
        let mut reducer = BucketReducer::new(samples.len() as u64, resolution).unwrap();
        for part in samples.chunks(chunk) {
            reducer.fold_chunk(part);
        }
        reducer.finish()
    }

    #[test]
    fn test_zero_length_source_has_no_reducer() {
        assert!(BucketReducer::new(0, 1000).is_none());
    }

    #[test]
    fn test_resolution_capped_by_frame_count() {
        let reducer = BucketReducer::new(10, 1000).unwrap();
        assert_eq!(reducer.resolution(), 10);
        assert_eq!(reducer.samples_per_bucket(), 1);

        let reducer = BucketReducer::new(48_000, 1000).unwrap();
        assert_eq!(reducer.resolution(), 1000);
        assert_eq!(reducer.samples_per_bucket(), 48);
    }

    #[test]
    fn test_trailing_frames_fold_into_last_bucket() {
        // 1999 帧 / 1000 桶 → 每桶 1 帧，超出部分全部落在最后一个桶
        let mut samples = vec![0.1_f32; 1999];
        samples[1998] = -0.5;
        let series = reduce(&samples, 1000, 256);
        assert_eq!(series.envelope.len(), 1000);
        assert_eq!(series.envelope[999], 1.0);
        assert_eq!(series.min_max[999].min, -1.0);
    }

    #[test]
    fn test_envelope_normalized_to_one() {
        let samples: Vec<f32> = (0..4000).map(|i| ((i as f32) * 0.01).sin() * 0.25).collect();
        let series = reduce(&samples, 100, 1000);
        let max = series.envelope.iter().copied().fold(0.0_f32, f32::max);
        assert_eq!(max, 1.0);
        assert!(series.envelope.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_silence_yields_all_zero() {
        let series = reduce(&vec![0.0; 5000], 100, 777);
        assert!(series.envelope.iter().all(|v| *v == 0.0));
        assert!(series.min_max.iter().all(|p| p.min == 0.0 && p.max == 0.0));
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let samples: Vec<f32> = (0..10_000).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();
        assert_eq!(reduce(&samples, 300, 64), reduce(&samples, 300, 10_000));
    }

    #[test]
    fn test_min_max_keeps_signed_extremes() {
        let samples = [0.2, -0.4, 0.1, 0.3, -0.1, 0.05];
        let series = reduce(&samples, 2, 4);
        // 峰值 0.4
        assert!((series.min_max[0].min + 1.0).abs() < 1e-6);
        assert!((series.min_max[0].max - 0.5).abs() < 1e-6);
        assert!((series.min_max[1].max - 0.75).abs() < 1e-6);
        assert!((series.min_max[1].min + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_min_max_uses_floor() {
        let mut pairs = vec![MinMaxPair::new(-0.0005, 0.0002)];
        normalize_min_max(&mut pairs);
        assert!((pairs[0].min + 0.5).abs() < 1e-6);
        assert!((pairs[0].max - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_envelope_noop_when_max_is_one() {
        let mut values = vec![0.25, 1.0, 0.5];
        normalize_envelope(&mut values);
        assert_eq!(values, vec![0.25, 1.0, 0.5]);
    }
}
