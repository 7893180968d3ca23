//! Random selection

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;
use url::Url;
use waypoint_discovery::{ServiceInstance, ServiceInstanceProvider};

use crate::balancer::{LoadBalancer, rewrite_or_passthrough};

/// Pick a uniformly random instance.
///
/// Returns `None` for an empty list.
pub fn pick_random(instances: &[ServiceInstance]) -> Option<&ServiceInstance> {
    if instances.is_empty() {
        return None;
    }
    let index = rand::rng().random_range(0..instances.len());
    instances.get(index)
}

/// Stateless balancer choosing a random instance on every call.
pub struct RandomLoadBalancer<P> {
    provider: P,
}

impl<P: ServiceInstanceProvider> RandomLoadBalancer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: ServiceInstanceProvider> LoadBalancer for RandomLoadBalancer<P> {
    async fn resolve_service_instance(&self, request: &Url) -> Url {
        let Some(service) = request.host_str() else {
            return request.clone();
        };

        let instances = self.provider.get_instances(service).await;
        match pick_random(&instances) {
            Some(instance) => rewrite_or_passthrough(request, instance),
            None => {
                warn!(service, "No instances available for service");
                request.clone()
            }
        }
    }
}
