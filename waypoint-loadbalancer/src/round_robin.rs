//! Round-robin selection

use async_trait::async_trait;
use tracing::warn;
use url::Url;
use waypoint_discovery::{ServiceInstance, ServiceInstanceProvider};

use crate::balancer::{LoadBalancer, rewrite_or_passthrough};
use crate::rotation::{InMemoryRotationStore, RotationStore};

/// Pick the next instance of `service` in rotation order.
///
/// The store is only consulted for a non-empty list, so an empty lookup
/// leaves the rotation untouched.
pub(crate) async fn select_rotating<'a, S>(
    store: &S,
    service: &str,
    instances: &'a [ServiceInstance],
) -> Option<&'a ServiceInstance>
where
    S: RotationStore + ?Sized,
{
    if instances.is_empty() {
        return None;
    }
    let index = store.next_index(service, instances.len()).await;
    // Stores are expected to stay in range; wrap anyway rather than panic
    instances.get(index).or_else(|| instances.first())
}

/// Balancer cycling through each service's instances in list order.
///
/// The position for each service name is kept in a [`RotationStore`],
/// process-local by default. When the instance list shrinks below the
/// stored position the rotation restarts at the first instance.
pub struct RoundRobinLoadBalancer<P, S = InMemoryRotationStore> {
    provider: P,
    store: S,
}

impl<P: ServiceInstanceProvider> RoundRobinLoadBalancer<P> {
    pub fn new(provider: P) -> Self {
        Self::with_store(provider, InMemoryRotationStore::new())
    }
}

impl<P, S> RoundRobinLoadBalancer<P, S>
where
    P: ServiceInstanceProvider,
    S: RotationStore,
{
    /// Use a custom rotation store
    pub fn with_store(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<P, S> LoadBalancer for RoundRobinLoadBalancer<P, S>
where
    P: ServiceInstanceProvider,
    S: RotationStore,
{
    async fn resolve_service_instance(&self, request: &Url) -> Url {
        let Some(service) = request.host_str() else {
            return request.clone();
        };

        let instances = self.provider.get_instances(service).await;
        match select_rotating(&self.store, service, &instances).await {
            Some(instance) => rewrite_or_passthrough(request, instance),
            None => {
                warn!(service, "No instances available for service");
                request.clone()
            }
        }
    }
}
