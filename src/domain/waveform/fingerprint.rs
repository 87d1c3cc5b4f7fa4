//! Content Fingerprint - source identity → cache key

use sha2::{Digest, Sha256};

use super::value_objects::{CacheKey, SourceIdentity};

/// SHA-256 十六进制摘要
pub fn digest_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

impl CacheKey {
    /// 派生缓存 key
    ///
    /// 同一个未修改的源总是得到相同的 key；mtime 变化则 key 变化，
    /// 所以编辑过的内容永远不会命中旧数据。
    pub fn derive(identity: &SourceIdentity) -> Self {
        Self::from_literal(&identity.identity_string())
    }

    /// 直接对任意字面量取摘要（历史 key 迁移用）
    pub fn from_literal(literal: &str) -> Self {
        Self::from_digest(digest_hex(literal))
    }
}
