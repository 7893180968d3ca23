//! Round-robin selection shared across processes

use async_trait::async_trait;
use tracing::error;
use url::Url;
use waypoint_cache::DistributedCache;
use waypoint_discovery::ServiceInstanceProvider;

use crate::balancer::{LoadBalancer, rewrite_or_passthrough};
use crate::rotation::CacheRotationStore;
use crate::round_robin::select_rotating;

/// Round-robin balancer whose rotation lives in a [`DistributedCache`].
///
/// Every balancer pointed at the same cache walks one rotation per service,
/// whichever process it runs in. Consistency is best effort, see
/// [`CacheRotationStore`]. A cache outage degrades to always serving the
/// first instance; it never fails a resolution.
pub struct RoundRobinDistributedLoadBalancer<P, C> {
    provider: P,
    store: CacheRotationStore<C>,
}

impl<P, C> RoundRobinDistributedLoadBalancer<P, C>
where
    P: ServiceInstanceProvider,
    C: DistributedCache,
{
    pub fn new(provider: P, cache: C) -> Self {
        Self {
            provider,
            store: CacheRotationStore::new(cache),
        }
    }

    /// Use `key_suffix` instead of `LoadBalancerIndex` for rotation keys
    pub fn with_key_suffix(provider: P, cache: C, key_suffix: impl Into<String>) -> Self {
        Self {
            provider,
            store: CacheRotationStore::with_key_suffix(cache, key_suffix),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &CacheRotationStore<C> {
        &self.store
    }
}

#[async_trait]
impl<P, C> LoadBalancer for RoundRobinDistributedLoadBalancer<P, C>
where
    P: ServiceInstanceProvider,
    C: DistributedCache,
{
    async fn resolve_service_instance(&self, request: &Url) -> Url {
        let Some(service) = request.host_str() else {
            return request.clone();
        };

        let instances = self.provider.get_instances(service).await;
        match select_rotating(&self.store, service, &instances).await {
            Some(instance) => rewrite_or_passthrough(request, instance),
            None => {
                error!(service, "No instances available for service");
                request.clone()
            }
        }
    }
}
