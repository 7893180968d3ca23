//! Shared caches for Waypoint.
//!
//! The distributed round-robin balancer keeps its rotation counters in a
//! byte-oriented key-value store so that every replica of a service walks one
//! shared rotation. This crate defines that store ([`DistributedCache`]) and
//! its backends.
//!
//! # Features
//!
//! - `redis` - Enable Redis cache support (enabled by default)
//!
//! # Examples
//!
//! ## In-memory
//!
//! ```
//! use waypoint_cache::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), CacheError> {
//! let cache = InMemoryCache::new();
//! cache.set("fruitserviceLoadBalancerIndex", 1u32.to_le_bytes().to_vec()).await?;
//! assert_eq!(cache.get("fruitserviceLoadBalancerIndex").await?, Some(vec![1, 0, 0, 0]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Redis
//!
//! ```no_run
//! use waypoint_cache::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CacheError> {
//!     let config = CacheConfig::redis("redis://localhost:6379")?.with_key_prefix("lb");
//!     let cache = RedisCache::new(config).await?;
//!     let index = cache.get("fruitserviceLoadBalancerIndex").await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use config::{CacheBackend, CacheConfig};
pub use error::{CacheError, CacheResult};
pub use memory::InMemoryCache;
pub use traits::DistributedCache;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
