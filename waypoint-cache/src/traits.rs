//! Shared cache trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Byte-oriented key-value store shared between processes.
///
/// Implementations make no atomicity promise across a `get` followed by a
/// `set`; callers that read-modify-write must tolerate lost updates.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Get the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()>;

    /// Remove `key` from the cache.
    async fn remove(&self, key: &str) -> CacheResult<()>;
}

#[async_trait]
impl<C> DistributedCache for Arc<C>
where
    C: DistributedCache + ?Sized,
{
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> CacheResult<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key).await
    }
}
