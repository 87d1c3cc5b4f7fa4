//! Incremental Trim - 裁剪后的切片与重新归一化
//!
//! 裁剪产生的新文件不重新解码：直接从旧文件的缓存序列中切出保留区间，
//! 再按切片自身的峰值重新归一化。
//!
//! 这是一个近似：当裁剪边界落在很粗的桶中间时（长录音），结果会与完整重新提取
//! 有少量偏差。

use std::ops::Range;

use super::extraction::{normalize_envelope, normalize_min_max};
use super::value_objects::MinMaxPair;

/// 保留的时间区间（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub original_duration: f64,
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(original_duration: f64, start: f64, end: f64) -> Self {
        Self {
            original_duration,
            start,
            end,
        }
    }

    /// 把时间区间换算成长度为 `count` 的序列上的下标区间
    ///
    /// - `start = floor(start / duration * count)`
    /// - `end = min(count, floor(end / duration * count))`
    ///
    /// 时长无效或区间为空时返回 None，调用方回退到完整提取。
    pub fn bucket_span(&self, count: usize) -> Option<Range<usize>> {
        let duration = self.original_duration;
        if !duration.is_finite() || duration <= 0.0 || count == 0 {
            return None;
        }

        let scale = count as f64 / duration;
        let start = (self.start * scale).floor().max(0.0) as usize;
        let end = ((self.end * scale).floor().max(0.0) as usize).min(count);

        (start < end).then_some(start..end)
    }
}

/// 切出包络并按切片自身最大值归一化
pub fn trim_envelope(series: &[f32], span: Range<usize>) -> Vec<f32> {
    let mut slice = series[span].to_vec();
    normalize_envelope(&mut slice);
    slice
}

/// 切出 min/max 并按切片自身峰值归一化
pub fn trim_min_max(series: &[MinMaxPair], span: Range<usize>) -> Vec<MinMaxPair> {
    let mut slice = series[span].to_vec();
    normalize_min_max(&mut slice);
    slice
}
