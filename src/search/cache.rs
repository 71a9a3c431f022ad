//! Search response cache / 搜索结果缓存
//!
//! Purely an optimization layer: every failure here degrades to a miss
//! (on read) or a skipped write (on store).

use sha2::{Digest, Sha256};
use std::time::Duration;

use super::types::{CachedSearchResponse, EntityKind};
use crate::cache::CacheBox;

/// Fixed TTL for every search response / 搜索缓存固定有效期
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(300);

/// Build the cache key for one search call / 生成缓存键
///
/// `query` must already be normalized. Fields are separated by NUL so
/// that no two distinct tuples share a digest input.
pub fn cache_key(kind: EntityKind, query: &str, limit: usize, offset: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(query.as_bytes());
    hasher.update([0u8]);
    hasher.update(limit.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(offset.to_string().as_bytes());
    format!("search:{}:{}", kind.as_str(), hex::encode(hasher.finalize()))
}

/// Search response cache over a byte backend / 搜索结果缓存
#[derive(Clone)]
pub struct ResultCache {
    backend: CacheBox,
}

impl ResultCache {
    pub fn new(backend: CacheBox) -> Self {
        Self { backend }
    }

    /// Read a cached response; errors and undecodable bytes are misses / 读取缓存
    pub async fn lookup(&self, key: &str) -> Option<CachedSearchResponse> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Search cache read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!("Discarding undecodable search cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store a response; failures are logged and swallowed / 写入缓存
    pub async fn store(&self, key: &str, response: &CachedSearchResponse) {
        let bytes = match serde_json::to_vec(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to serialize search response for {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.backend.set(key, bytes, SEARCH_CACHE_TTL).await {
            tracing::warn!("Search cache write failed for {}: {}", key, e);
        }
    }

    /// Drop one cached response / 删除缓存
    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            tracing::warn!("Search cache delete failed for {}: {}", key, e);
        }
    }
}
