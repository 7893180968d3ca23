//! Redis cache implementation.

use crate::config::{CacheBackend, CacheConfig};
use crate::error::{CacheError, CacheResult};
use crate::traits::DistributedCache;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use tracing::debug;

/// Redis cache store.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: CacheConfig,
}

impl RedisCache {
    /// Create a new Redis cache instance.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use waypoint_cache::*;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), CacheError> {
    ///     let config = CacheConfig::redis("redis://localhost:6379")?.with_key_prefix("lb");
    ///     let cache = RedisCache::new(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        if config.backend != CacheBackend::Redis {
            return Err(CacheError::Config(format!(
                "expected a Redis configuration, got {:?}",
                config.backend
            )));
        }

        let client =
            Client::open(config.url.as_str()).map_err(|e| CacheError::Connection(e.to_string()))?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| CacheError::Timeout)?
                .map_err(|e| CacheError::Connection(e.to_string()))?;

        debug!(url = %config.url, "Connected to Redis");
        Ok(Self { connection, config })
    }

    /// Get the underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Build the full key with prefix.
    fn build_key(&self, key: &str) -> String {
        self.config.build_key(key)
    }

    /// Bound a command by the configured operation timeout.
    async fn bounded<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait]
impl DistributedCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let key = self.build_key(key);
        let mut conn = self.connection.clone();

        let value: Option<Vec<u8>> = self.bounded(conn.get(&key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
        let key = self.build_key(key);
        let mut conn = self.connection.clone();

        match self.config.default_ttl {
            Some(ttl) => {
                let _: () = self
                    .bounded(conn.set_ex(&key, value, ttl.as_secs().max(1)))
                    .await?;
            }
            None => {
                let _: () = self.bounded(conn.set(&key, value)).await?;
            }
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let key = self.build_key(key);
        let mut conn = self.connection.clone();

        let _: () = self.bounded(conn.del(&key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key() {
        let config = CacheConfig::redis("redis://localhost:6379")
            .unwrap()
            .with_key_prefix("test");

        // Connecting needs a live server; the prefix logic does not
        assert_eq!(config.build_key("key"), "test:key");
    }

    #[tokio::test]
    async fn test_memory_config_is_rejected() {
        let result = RedisCache::new(CacheConfig::memory()).await;
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[tokio::test]
    #[ignore = "requires a Redis server on localhost:6379"]
    async fn test_round_trip_against_server() {
        let config = CacheConfig::redis("redis://localhost:6379")
            .unwrap()
            .with_key_prefix("waypoint-test");
        let cache = RedisCache::new(config).await.unwrap();

        cache.set("idx", 3u32.to_le_bytes().to_vec()).await.unwrap();
        assert_eq!(cache.get("idx").await.unwrap(), Some(vec![3, 0, 0, 0]));

        cache.remove("idx").await.unwrap();
        assert_eq!(cache.get("idx").await.unwrap(), None);
    }
}
