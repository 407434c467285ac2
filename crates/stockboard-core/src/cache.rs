//! In-memory freshness cache for gateway results.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a single gateway call treats the freshness cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Serve a fresh entry when present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, ignoring any entry, and store the new result.
    Refresh,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> CacheInner<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() <= entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: K, value: V) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
        self.map.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }
}

/// Thread-safe cache whose entries stay fresh for a fixed window.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<K, V>>>,
}

impl<K, V> Clone for CacheStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Eq + Hash, V: Clone> CacheStore<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    /// Returns the value for `key` if present and still fresh.
    pub async fn get(&self, key: &K) -> Option<V> {
        let store = self.inner.read().await;
        store.get(key)
    }

    /// Stores `value`, sweeping expired entries first. A no-op with a zero
    /// freshness window.
    pub async fn put(&self, key: K, value: V) {
        let mut store = self.inner.write().await;
        if store.ttl == Duration::ZERO {
            return;
        }
        store.put(key, value);
    }

    /// Drops the entry for `key`. Returns whether an entry existed.
    pub async fn invalidate(&self, key: &K) -> bool {
        let mut store = self.inner.write().await;
        store.map.remove(key).is_some()
    }

    /// Number of entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let cache = CacheStore::new(Duration::from_secs(1));

        assert!(cache.get(&"key1").await.is_none());

        cache.put("key1", String::from("value1")).await;
        assert_eq!(cache.get(&"key1").await, Some(String::from("value1")));

        cache.put("key1", String::from("value2")).await;
        assert_eq!(cache.get(&"key1").await, Some(String::from("value2")));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1_u32).await;
        assert!(cache.get(&"key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get(&"key1").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_invalidate_only_touches_one_key() {
        let cache = CacheStore::new(Duration::from_secs(60));

        cache.put("overview", 1_u32).await;
        cache.put("series", 2_u32).await;

        assert!(cache.invalidate(&"overview").await);
        assert!(!cache.invalidate(&"overview").await);
        assert!(cache.get(&"overview").await.is_none());
        assert_eq!(cache.get(&"series").await, Some(2));
    }

    #[tokio::test]
    async fn test_cache_put_sweeps_expired_entries() {
        let cache = CacheStore::new(Duration::from_millis(100));

        cache.put("key1", 1_u32).await;
        cache.put("key2", 2_u32).await;
        assert_eq!(cache.len().await, 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.put("key3", 3_u32).await;

        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_zero_window_stores_nothing() {
        let cache = CacheStore::new(Duration::ZERO);

        cache.put("key1", 1_u32).await;
        assert!(cache.get(&"key1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
