//! Integration tests for waypoint-cache

use std::sync::Arc;
use std::time::Duration;
use waypoint_cache::*;

#[test]
fn test_cache_config_creation() {
    let config = CacheConfig::redis("redis://localhost:6379").unwrap();
    assert_eq!(config.backend, CacheBackend::Redis);
    assert_eq!(config.url, "redis://localhost:6379");

    assert_eq!(CacheConfig::default().backend, CacheBackend::Memory);
}

#[test]
fn test_cache_error_display() {
    let err = CacheError::Connection("Failed to connect".to_string());
    assert!(err.to_string().contains("Failed to connect"));
    assert_eq!(CacheError::Timeout.to_string(), "Operation timeout");
}

#[tokio::test]
async fn test_trait_object_over_arc() {
    let cache: Arc<dyn DistributedCache> = Arc::new(InMemoryCache::new());
    let handle = cache.clone();

    handle.set("vegetableserviceLoadBalancerIndex", vec![2, 0, 0, 0]).await.unwrap();
    assert_eq!(
        cache.get("vegetableserviceLoadBalancerIndex").await.unwrap(),
        Some(vec![2, 0, 0, 0])
    );
}

#[tokio::test(start_paused = true)]
async fn test_memory_backend_from_config() {
    let config = CacheConfig::memory().with_default_ttl(Duration::from_secs(1));
    let cache = InMemoryCache::with_config(&config);

    cache.set("k", vec![1]).await.unwrap();
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get("k").await.unwrap(), None);
}

// Requires Redis running: cargo test -- --ignored
#[cfg(feature = "redis")]
#[tokio::test]
#[ignore]
async fn test_redis_cache_set_get() {
    let config = CacheConfig::redis("redis://localhost:6379")
        .unwrap()
        .with_key_prefix("waypoint-it");
    let cache = RedisCache::new(config).await.unwrap();

    cache.set("test_key", b"value".to_vec()).await.unwrap();
    assert_eq!(cache.get("test_key").await.unwrap(), Some(b"value".to_vec()));

    cache.remove("test_key").await.unwrap();
}
