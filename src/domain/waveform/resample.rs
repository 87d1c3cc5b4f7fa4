//! Resampling Engine
//!
//! 把长度 N 的存储序列映射到调用方要求的长度 M：
//! - N < M: 线性插值
//! - N > M: 分桶取极值（包络取最大值，min/max 取真实最小/最大）
//!
//! 下采样故意不用均值：均值会把视觉上的峰值抹平。

use std::sync::Arc;

use super::value_objects::{CacheKey, MinMaxPair};

/// 可重采样的元素
pub trait Resample: Copy {
    /// 在 a、b 之间按权重 t 插值
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    /// 把同一输出桶里的两个元素合并
    fn merge(acc: Self, next: Self) -> Self;
}

impl Resample for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn merge(acc: Self, next: Self) -> Self {
        acc.max(next)
    }
}

impl Resample for MinMaxPair {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        MinMaxPair::new(f32::lerp(a.min, b.min, t), f32::lerp(a.max, b.max, t))
    }

    fn merge(acc: Self, next: Self) -> Self {
        MinMaxPair::new(acc.min.min(next.min), acc.max.max(next.max))
    }
}

/// 重采样到 `target` 个元素
///
/// 空输入或 target 为 0 返回空序列；N == M 原样返回。
pub fn resample<T: Resample>(series: &[T], target: usize) -> Vec<T> {
    let len = series.len();
    if len == 0 || target == 0 {
        return Vec::new();
    }
    if len == target {
        return series.to_vec();
    }
    if len < target {
        upsample(series, target)
    } else {
        downsample(series, target)
    }
}

fn upsample<T: Resample>(series: &[T], target: usize) -> Vec<T> {
    let last = series.len() - 1;
    let mut out = Vec::with_capacity(target);

    for i in 0..target {
        let position = i as f64 * last as f64 / (target - 1) as f64;
        let index = (position.floor() as usize).min(last);
        let fraction = (position - index as f64) as f32;
        let next = (index + 1).min(last);
        out.push(T::lerp(series[index], series[next], fraction));
    }

    out
}

fn downsample<T: Resample>(series: &[T], target: usize) -> Vec<T> {
    let len = series.len();
    let ratio = len as f64 / target as f64;
    let mut out = Vec::with_capacity(target);

    for i in 0..target {
        let start = ((i as f64 * ratio).floor() as usize).min(len - 1);
        let end = (((i + 1) as f64 * ratio).floor() as usize).clamp(start + 1, len);
        let value = series[start + 1..end]
            .iter()
            .fold(series[start], |acc, &next| T::merge(acc, next));
        out.push(value);
    }

    out
}

/// 最近一次重采样结果
///
/// 交互式缩放时同一分辨率会在一秒内被请求很多次，这里只记一个槽位。
/// 不承担正确性：随时可以 invalidate。
#[derive(Debug)]
pub struct ResampleMemo<T> {
    slot: Option<MemoSlot<T>>,
    hits: u64,
}

#[derive(Debug)]
struct MemoSlot<T> {
    key: CacheKey,
    target: usize,
    result: Arc<[T]>,
}

impl<T: Resample> ResampleMemo<T> {
    pub fn new() -> Self {
        Self { slot: None, hits: 0 }
    }

    pub fn get_or_compute(&mut self, key: &CacheKey, target: usize, series: &[T]) -> Arc<[T]> {
        if let Some(slot) = &self.slot {
            if slot.key == *key && slot.target == target {
                self.hits += 1;
                return slot.result.clone();
            }
        }

        let result: Arc<[T]> = resample(series, target).into();
        self.slot = Some(MemoSlot {
            key: key.clone(),
            target,
            result: result.clone(),
        });
        result
    }

    /// key 对应的数据被替换/淘汰时调用
    pub fn invalidate(&mut self, key: &CacheKey) {
        if self.slot.as_ref().is_some_and(|slot| slot.key == *key) {
            self.slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

impl<T: Resample> Default for ResampleMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::waveform::digest_hex;

    fn key(seed: &str) -> CacheKey {
        CacheKey::parse(&digest_hex(seed)).unwrap()
    }

    #[test]
    fn test_empty_and_zero_target() {
        assert!(resample::<f32>(&[], 10).is_empty());
        assert!(resample(&[1.0_f32, 2.0], 0).is_empty());
    }

    #[test]
    fn test_identity_length_returns_input() {
        let series = vec![0.1_f32, 0.7, 0.3, 1.0];
        assert_eq!(resample(&series, 4), series);
    }

    #[test]
    fn test_downsample_preserves_peak() {
        let series = [0.0_f32, 0.0, 1.0, 0.0, 0.0];
        assert_eq!(resample(&series, 1), vec![1.0]);
    }

    #[test]
    fn test_downsample_buckets() {
        let series = [0.1_f32, 0.5, 0.2, 0.9, 0.3, 0.4];
        assert_eq!(resample(&series, 3), vec![0.5, 0.9, 0.4]);
        // 不整除: 6/4 = 1.5 → [0,1) [1,3) [3,4) [4,6)
        assert_eq!(resample(&series, 4), vec![0.1, 0.5, 0.9, 0.4]);
    }

    #[test]
    fn test_downsample_min_max_true_extremes() {
        let series = [
            MinMaxPair::new(-0.2, 0.3),
            MinMaxPair::new(-0.8, 0.1),
            MinMaxPair::new(-0.1, 0.9),
            MinMaxPair::new(-0.4, 0.2),
        ];
        let out = resample(&series, 2);
        assert_eq!(out, vec![MinMaxPair::new(-0.8, 0.3), MinMaxPair::new(-0.4, 0.9)]);
    }

    #[test]
    fn test_upsample_interpolates() {
        let out = resample(&[0.0_f32, 1.0], 5);
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let pairs = resample(&[MinMaxPair::new(-1.0, 0.0), MinMaxPair::new(0.0, 1.0)], 3);
        assert_eq!(pairs[1], MinMaxPair::new(-0.5, 0.5));
    }

    #[test]
    fn test_upsample_single_value() {
        assert_eq!(resample(&[0.4_f32], 3), vec![0.4, 0.4, 0.4]);
    }

    #[test]
    fn test_exact_length_for_many_targets() {
        let series: Vec<f32> = (0..1000).map(|i| (i % 17) as f32 / 17.0).collect();
        for target in [1, 2, 3, 7, 333, 999, 1001, 4096] {
            assert_eq!(resample(&series, target).len(), target);
        }
    }

    #[test]
    fn test_repeat_is_bit_identical() {
        let series: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.37).sin().abs()).collect();
        let a = resample(&series, 321);
        let b = resample(&series, 321);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_memo_short_circuits_repeat() {
        let mut memo = ResampleMemo::new();
        let series = vec![0.0_f32, 0.5, 1.0, 0.5];
        let k = key("a");

        let first = memo.get_or_compute(&k, 2, &series);
        let second = memo.get_or_compute(&k, 2, &series);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memo.hits(), 1);

        memo.get_or_compute(&k, 3, &series);
        assert_eq!(memo.hits(), 1);
    }

    #[test]
    fn test_memo_invalidate_only_matching_key() {
        let mut memo = ResampleMemo::new();
        let series = vec![0.0_f32, 1.0];
        let k = key("a");
        memo.get_or_compute(&k, 4, &series);

        memo.invalidate(&key("b"));
        memo.get_or_compute(&k, 4, &series);
        assert_eq!(memo.hits(), 1);

        memo.invalidate(&k);
        memo.get_or_compute(&k, 4, &series);
        assert_eq!(memo.hits(), 1);
    }
}
