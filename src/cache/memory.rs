//! In-process TTL cache / 内存缓存
//!
//! Shared by all requests. Concurrent writes to one key are last-write-wins.
//! Entries are also indexed by expiry, so purging and eviction only touch
//! the entries they remove.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use super::CacheBackend;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Entries plus an expiry-ordered index / 条目与过期时间索引
#[derive(Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    by_expiry: BTreeSet<(Instant, String)>,
}

impl Entries {
    fn insert(&mut self, key: &str, entry: CacheEntry) {
        let expires_at = entry.expires_at;
        if let Some(old) = self.map.insert(key.to_string(), entry) {
            self.by_expiry.remove(&(old.expires_at, key.to_string()));
        }
        self.by_expiry.insert((expires_at, key.to_string()));
    }

    fn remove(&mut self, key: &str) {
        if let Some(old) = self.map.remove(key) {
            self.by_expiry.remove(&(old.expires_at, key.to_string()));
        }
    }

    /// Remove the entry that expires first / 移除最早过期的条目
    fn pop_soonest(&mut self) -> Option<Instant> {
        let (expires_at, key) = self.by_expiry.pop_first()?;
        self.map.remove(&key);
        Some(expires_at)
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(expires_at) = self.by_expiry.first().map(|(at, _)| *at) {
            if now < expires_at {
                break;
            }
            self.pop_soonest();
            removed += 1;
        }
        removed
    }
}

/// Memory cache / 内存缓存
pub struct MemoryCache {
    entries: RwLock<Entries>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// Drop expired entries, returning how many were removed / 清理过期条目
    pub fn purge_expired(&self) -> usize {
        self.entries.write().purge_expired(Instant::now())
    }

    /// Number of stored entries, expired ones included / 条目数量
    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        Ok(entries
            .map
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.data.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        if !entries.map.contains_key(key) {
            // Expired entries sort first, so they go before live ones
            while entries.map.len() >= self.max_entries {
                if entries.pop_soonest().is_none() {
                    break;
                }
            }
        }
        entries.insert(
            key,
            CacheEntry {
                data: value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new(10);
        assert!(cache.get("a").await.unwrap().is_none());

        cache.set("a", b"one".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some(&b"one"[..]));

        cache.set("a", b"two".to_vec(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(cache.len(), 1);

        cache.delete("a").await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let cache = MemoryCache::new(10);
        cache.set("gone", b"x".to_vec(), Duration::ZERO).await.unwrap();
        cache.set("kept", b"y".to_vec(), Duration::from_secs(60)).await.unwrap();

        assert!(cache.get("gone").await.unwrap().is_none());
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("kept").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_full_cache_evicts_soonest_expiry() {
        let cache = MemoryCache::new(2);
        cache.set("short", b"1".to_vec(), Duration::from_secs(10)).await.unwrap();
        cache.set("long", b"2".to_vec(), Duration::from_secs(100)).await.unwrap();
        cache.set("new", b"3".to_vec(), Duration::from_secs(50)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("long").await.unwrap().is_some());
        assert!(cache.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache = MemoryCache::new(2);
        cache.set("a", b"1".to_vec(), Duration::from_secs(10)).await.unwrap();
        cache.set("b", b"2".to_vec(), Duration::from_secs(10)).await.unwrap();
        cache.set("a", b"3".to_vec(), Duration::from_secs(10)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_moves_entry_in_expiry_order() {
        let cache = MemoryCache::new(2);
        cache.set("a", b"1".to_vec(), Duration::from_secs(10)).await.unwrap();
        cache.set("b", b"2".to_vec(), Duration::from_secs(50)).await.unwrap();
        cache.set("a", b"3".to_vec(), Duration::from_secs(100)).await.unwrap();
        cache.set("c", b"4".to_vec(), Duration::from_secs(100)).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").await.unwrap().is_none());
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some(&b"3"[..]));
        assert!(cache.get("c").await.unwrap().is_some());

        cache.delete("a").await.unwrap();
        assert_eq!(cache.purge_expired(), 0);
        assert_eq!(cache.len(), 1);
    }
}
