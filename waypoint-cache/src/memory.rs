//! Process-local cache

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::traits::DistributedCache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// In-memory cache.
///
/// Shares state only between handles cloned from the same instance, which is
/// enough to coordinate several balancers inside one process or in tests.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    data: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Option<Duration>,
}

#[derive(Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

impl InMemoryCache {
    /// Create new in-memory cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from configuration; only the default TTL applies
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            data: Arc::default(),
            default_ttl: config.default_ttl,
        }
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.data.read().await.values().filter(|e| e.is_live(now)).count()
    }

    /// Whether the cache holds no live entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();
        self.data.write().await.retain(|_, entry| entry.is_live(now));
    }
}

#[async_trait]
impl DistributedCache for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let data = self.data.read().await;
        Ok(data
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
        let expires_at = self.default_ttl.map(|ttl| Instant::now() + ttl);
        self.data
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.data.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let cache = InMemoryCache::new();

        assert_eq!(cache.get("missing").await.unwrap(), None);

        cache.set("key", vec![1, 0, 0, 0]).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(vec![1, 0, 0, 0]));

        cache.set("key", vec![2, 0, 0, 0]).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(vec![2, 0, 0, 0]));

        cache.remove("key").await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = InMemoryCache::new();
        let other = cache.clone();

        cache.set("shared", b"x".to_vec()).await.unwrap();
        assert_eq!(other.get("shared").await.unwrap(), Some(b"x".to_vec()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_expires_entries() {
        let config = CacheConfig::memory().with_default_ttl(Duration::from_secs(10));
        let cache = InMemoryCache::with_config(&config);

        cache.set("key", vec![7]).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("key").await.unwrap(), Some(vec![7]));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get("key").await.unwrap(), None);
        assert_eq!(cache.len().await, 0);

        cache.cleanup_expired().await;
        assert!(cache.data.read().await.is_empty());
    }
}
