//! 历史缓存 key 格式迁移
//!
//! 快照里的 key 可能是三种格式之一：
//! 1. 当前格式：64 位十六进制摘要
//! 2. 旧格式：`{location}_{seconds}` 字面量（内嵌时间戳）
//! 3. 更旧的格式：只有 location
//!
//! 加载时统一换算成当前格式，不需要阻塞式的迁移步骤。

use std::path::Path;

use super::value_objects::{CacheKey, SourceIdentity};

/// 从快照中读到的 key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedKey {
    /// 已经是当前格式
    Current(CacheKey),
    /// `{location}_{seconds}` 字面量
    EmbeddedTimestamp { location: String, literal: String },
    /// 裸 location
    BareLocation(String),
}

impl PersistedKey {
    /// 识别 key 格式，空 key 返回 None
    pub fn classify(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }

        if let Some(key) = CacheKey::parse(raw) {
            return Some(Self::Current(key));
        }

        if let Some((location, suffix)) = raw.rsplit_once('_') {
            if !location.is_empty() && is_decimal_seconds(suffix) {
                return Some(Self::EmbeddedTimestamp {
                    location: location.to_string(),
                    literal: raw.to_string(),
                });
            }
        }

        Some(Self::BareLocation(raw.to_string()))
    }

    /// 换算成当前格式的 key，并给出需要登记到反向索引的 location
    ///
    /// 裸 location 使用该路径*当前*的 mtime 派生（尽力而为）。
    pub fn resolve(self) -> (CacheKey, Option<String>) {
        match self {
            Self::Current(key) => (key, None),
            Self::EmbeddedTimestamp { location, literal } => {
                (CacheKey::from_literal(&literal), Some(location))
            }
            Self::BareLocation(location) => {
                let identity = SourceIdentity::probe(Path::new(&location));
                (CacheKey::derive(&identity), Some(identity.location().to_string()))
            }
        }
    }
}

/// `123.456` 形式：整数部分和小数部分都只有数字，且必须带小数点
fn is_decimal_seconds(suffix: &str) -> bool {
    match suffix.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::waveform::digest_hex;

    #[test]
    fn test_classify_current_hash() {
        let hex = digest_hex("whatever");
        match PersistedKey::classify(&hex) {
            Some(PersistedKey::Current(key)) => assert_eq!(key.as_str(), hex),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_classify_embedded_timestamp() {
        let raw = "/music/take_2.wav_1700000000.250000";
        assert_eq!(
            PersistedKey::classify(raw),
            Some(PersistedKey::EmbeddedTimestamp {
                location: "/music/take_2.wav".to_string(),
                literal: raw.to_string(),
            })
        );
    }

    #[test]
    fn test_classify_bare_location() {
        // 后缀没有小数点，不当作时间戳
        assert_eq!(
            PersistedKey::classify("/music/take_2"),
            Some(PersistedKey::BareLocation("/music/take_2".to_string()))
        );
        assert_eq!(
            PersistedKey::classify("/music/loop.wav"),
            Some(PersistedKey::BareLocation("/music/loop.wav".to_string()))
        );
        assert_eq!(PersistedKey::classify("  "), None);
    }

    #[test]
    fn test_embedded_timestamp_rehashes_literal() {
        let raw = "/music/a.wav_1700000000.000000";
        let (key, location) = PersistedKey::classify(raw).unwrap().resolve();
        assert_eq!(key.as_str(), digest_hex(raw));
        assert_eq!(location.as_deref(), Some("/music/a.wav"));
    }

    #[test]
    fn test_embedded_timestamp_matches_derived_key() {
        use chrono::{TimeZone, Utc};

        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        let identity = SourceIdentity::new("/music/a.wav", Some(ts));
        let (key, _) = PersistedKey::classify(&identity.identity_string())
            .unwrap()
            .resolve();
        assert_eq!(key, CacheKey::derive(&identity));
    }

    #[test]
    fn test_bare_location_uses_current_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.wav");
        std::fs::write(&path, b"x").unwrap();
        let location = path.to_string_lossy().to_string();

        let (key, registered) = PersistedKey::classify(&location).unwrap().resolve();
        assert_eq!(key, CacheKey::derive(&SourceIdentity::probe(&path)));
        assert_eq!(registered, Some(location));
    }
}
