//! Waveform Context - Value Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 音频源身份
///
/// location + 访问时刻的最后修改时间。
/// 只用于派生 cache key 和填充反向索引，本身不持久化。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    location: String,
    modified: Option<DateTime<Utc>>,
}

impl SourceIdentity {
    pub fn new(location: impl Into<String>, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            location: location.into(),
            modified,
        }
    }

    /// 从文件系统读取 mtime（尽力而为）
    ///
    /// 读不到 mtime 时退化为只有 location 的身份，此时文件被编辑后 key 不会变化。
    pub fn probe(path: &Path) -> Self {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Self::new(path.to_string_lossy(), modified)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// 身份字符串
    ///
    /// - 有 mtime: `{location}_{unix_seconds}`（6 位小数）
    /// - 无 mtime: `{location}`
    pub fn identity_string(&self) -> String {
        match self.modified {
            Some(ts) => format!("{}_{}", self.location, format_timestamp(ts)),
            None => self.location.clone(),
        }
    }
}

/// 将时间戳格式化为 `秒.微秒`，整数运算避免浮点格式化误差
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    let micros = ts.timestamp_micros();
    format!(
        "{}.{:06}",
        micros.div_euclid(1_000_000),
        micros.rem_euclid(1_000_000)
    )
}

/// 缓存 key
///
/// 不变量: 64 位小写十六进制（SHA-256）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub const LEN: usize = 64;

    /// 解析已经是当前格式的 key
    pub fn parse(raw: &str) -> Option<Self> {
        let is_digest = raw.len() == Self::LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        is_digest.then(|| Self(raw.to_string()))
    }

    pub(super) fn from_digest(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 单个桶的真实峰谷
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMaxPair {
    pub min: f32,
    pub max: f32,
}

impl MinMaxPair {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 绝对值峰值
    pub fn peak(&self) -> f32 {
        self.min.abs().max(self.max.abs())
    }
}

/// 序列类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// 幅度包络
    #[default]
    Envelope,
    /// 峰谷对
    MinMax,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::Envelope => write!(f, "envelope"),
            SeriesKind::MinMax => write!(f, "minmax"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_identity_string_with_timestamp() {
        let ts = Utc.timestamp_opt(1_700_000_000, 250_000_000).unwrap();
        let identity = SourceIdentity::new("/audio/take.wav", Some(ts));
        assert_eq!(identity.identity_string(), "/audio/take.wav_1700000000.250000");
    }

    #[test]
    fn test_identity_string_without_timestamp() {
        let identity = SourceIdentity::new("/audio/take.wav", None);
        assert_eq!(identity.identity_string(), "/audio/take.wav");
    }

    #[test]
    fn test_probe_missing_file_has_no_timestamp() {
        let identity = SourceIdentity::probe(Path::new("/definitely/not/here.wav"));
        assert!(identity.modified().is_none());
        assert_eq!(identity.location(), "/definitely/not/here.wav");
    }

    #[test]
    fn test_cache_key_parse() {
        let hex = "a".repeat(64);
        assert!(CacheKey::parse(&hex).is_some());
        assert!(CacheKey::parse(&"A".repeat(64)).is_none());
        assert!(CacheKey::parse("abc").is_none());
        assert!(CacheKey::parse(&"g".repeat(64)).is_none());
    }

    #[test]
    fn test_min_max_peak() {
        assert_eq!(MinMaxPair::new(-0.5, 0.8).peak(), 0.8);
        assert_eq!(MinMaxPair::new(-0.9, 0.2).peak(), 0.9);
    }

    #[test]
    fn test_series_kind_serde() {
        let kind: SeriesKind = serde_json::from_str("\"minmax\"").unwrap();
        assert_eq!(kind, SeriesKind::MinMax);
        assert_eq!(serde_json::to_string(&SeriesKind::Envelope).unwrap(), "\"envelope\"");
    }
}
