//! Cache backends / 缓存后端
//!
//! Byte-oriented key/value store with per-entry TTL. Callers own the
//! serialization format.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub mod memory;

pub use memory::MemoryCache;

pub type CacheBox = Arc<dyn CacheBackend>;

/// Cache backend interface / 缓存后端接口
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a value; absent or expired keys return `Ok(None)` / 读取缓存
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one / 写入缓存
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove a value / 删除缓存
    async fn delete(&self, key: &str) -> Result<()>;
}
