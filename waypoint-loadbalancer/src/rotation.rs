//! Rotation state for round-robin balancing
//!
//! A rotation store remembers, per service name, which position of the
//! instance list to serve next. Two stores exist: [`InMemoryRotationStore`]
//! for a single process and [`CacheRotationStore`] for replicas sharing a
//! [`DistributedCache`].

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;
use waypoint_cache::DistributedCache;

/// Suffix appended to a service name to form its rotation cache key.
pub const DEFAULT_KEY_SUFFIX: &str = "LoadBalancerIndex";

/// Width of an encoded rotation index.
const INDEX_WIDTH: usize = 4;

/// Per-service rotation counters.
#[async_trait]
pub trait RotationStore: Send + Sync {
    /// Pick the position to serve from a list of `len` instances (`len > 0`)
    /// and advance the rotation for `service_name`.
    async fn next_index(&self, service_name: &str, len: usize) -> usize;
}

/// Apply one rotation step to a stored index.
///
/// Returns `(selected, next)`. A stored index past the end of the current
/// list (first use, or the list shrank) restarts the rotation at 0.
pub fn rotate(stored: usize, len: usize) -> (usize, usize) {
    let selected = if stored >= len { 0 } else { stored };
    (selected, selected + 1)
}

/// Process-local rotation counters.
///
/// Each service name's read-modify-write runs under its `DashMap` shard
/// lock, so concurrent callers never advance from the same value.
#[derive(Debug, Default)]
pub struct InMemoryRotationStore {
    next: DashMap<String, usize>,
}

impl InMemoryRotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored next index for a service, if it was ever resolved
    pub fn current(&self, service_name: &str) -> Option<usize> {
        self.next.get(service_name).map(|next| *next)
    }

    fn advance(&self, service_name: &str, len: usize) -> usize {
        let mut next = self.next.entry(service_name.to_owned()).or_insert(0);
        let (selected, advanced) = rotate(*next, len);
        *next = advanced;
        selected
    }
}

#[async_trait]
impl RotationStore for InMemoryRotationStore {
    async fn next_index(&self, service_name: &str, len: usize) -> usize {
        self.advance(service_name, len)
    }
}

/// Rotation counters kept in a shared cache.
///
/// The counter for a service lives under `"<service><suffix>"` as a 4-byte
/// little-endian integer. Reading and writing it are two separate round
/// trips: replicas racing on the same service can read the same value and
/// serve the same instance twice. That duplicate is tolerated; an atomic
/// increment in the cache would be needed to rule it out.
///
/// Cache failures never escape: a failed or malformed read counts as a miss
/// (index 0) and a failed write is only logged.
pub struct CacheRotationStore<C> {
    cache: C,
    key_suffix: String,
}

impl<C: DistributedCache> CacheRotationStore<C> {
    pub fn new(cache: C) -> Self {
        Self::with_key_suffix(cache, DEFAULT_KEY_SUFFIX)
    }

    pub fn with_key_suffix(cache: C, key_suffix: impl Into<String>) -> Self {
        Self {
            cache,
            key_suffix: key_suffix.into(),
        }
    }

    /// Cache key holding the rotation index of `service_name`
    pub fn cache_key(&self, service_name: &str) -> String {
        format!("{}{}", service_name, self.key_suffix)
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    async fn load(&self, key: &str) -> usize {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => decode_index(&bytes).unwrap_or_else(|| {
                warn!(
                    key,
                    len = bytes.len(),
                    "Malformed rotation index in cache, restarting rotation"
                );
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(key, error = %e, "Rotation cache read failed, treating as miss");
                0
            }
        }
    }
}

#[async_trait]
impl<C: DistributedCache> RotationStore for CacheRotationStore<C> {
    async fn next_index(&self, service_name: &str, len: usize) -> usize {
        let key = self.cache_key(service_name);
        let (selected, next) = rotate(self.load(&key).await, len);

        if let Err(e) = self.cache.set(&key, encode_index(next)).await {
            warn!(key = %key, error = %e, "Rotation cache write failed, rotation not advanced");
        }

        selected
    }
}

/// Encode a rotation index for the shared cache.
pub fn encode_index(index: usize) -> Vec<u8> {
    // An index beyond u32 restarts the rotation, same as an out-of-range one
    u32::try_from(index).unwrap_or(0).to_le_bytes().to_vec()
}

/// Decode a rotation index; `None` if fewer than four bytes are present.
pub fn decode_index(bytes: &[u8]) -> Option<usize> {
    let raw: [u8; INDEX_WIDTH] = bytes.get(..INDEX_WIDTH)?.try_into().ok()?;
    usize::try_from(u32::from_le_bytes(raw)).ok()
}
