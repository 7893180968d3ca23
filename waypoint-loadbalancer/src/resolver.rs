//! Discovery-aware URI resolution
//!
//! [`DiscoveryResolver`] lets logical service URIs and literal addresses share
//! one code path: a URI on its scheme's default port names a service and is
//! resolved through discovery, any other port is already concrete.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};
use url::Url;
use waypoint_discovery::{ServiceInstance, ServiceInstanceProvider};

use crate::balancer::{LoadBalancer, rewrite_or_passthrough};
use crate::error::{LoadBalancerError, Result};
use crate::random::pick_random;

/// Chooses one instance out of a non-empty list.
pub trait InstanceSelector: Send + Sync {
    fn select_host<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

impl<S: InstanceSelector + ?Sized> InstanceSelector for Arc<S> {
    fn select_host<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        (**self).select_host(instances)
    }
}

/// Uniformly random selection; the resolver's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl InstanceSelector for RandomSelector {
    fn select_host<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        pick_random(instances)
    }
}

/// Always the first instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSelector;

impl InstanceSelector for FirstSelector {
    fn select_host<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        instances.first()
    }
}

/// Resolves default-port URIs through a provider, passes the rest through.
#[derive(Clone)]
pub struct DiscoveryResolver {
    provider: Arc<dyn ServiceInstanceProvider>,
    selector: Arc<dyn InstanceSelector>,
}

impl fmt::Debug for DiscoveryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryResolver").finish_non_exhaustive()
    }
}

impl DiscoveryResolver {
    /// Create a resolver selecting instances at random
    pub fn new(provider: impl ServiceInstanceProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            selector: Arc::new(RandomSelector),
        }
    }

    pub fn builder() -> DiscoveryResolverBuilder {
        DiscoveryResolverBuilder::default()
    }

    /// Rewrite `current` to a discovered instance.
    ///
    /// URIs with an explicit non-default port, or without a host, are
    /// returned unchanged and the provider is not consulted. A service with
    /// no instances is logged and returned unchanged.
    pub async fn lookup_service(&self, current: &Url) -> Url {
        trace!(uri = %current, "Looking up service");

        if current.port().is_some() {
            return current.clone();
        }
        let Some(service) = current.host_str() else {
            return current.clone();
        };

        let instances = self.provider.get_instances(service).await;
        match self.selector.select_host(&instances) {
            Some(instance) => rewrite_or_passthrough(current, instance),
            None => {
                warn!(service, "Attempted to resolve service but found 0 instances");
                current.clone()
            }
        }
    }
}

#[async_trait]
impl LoadBalancer for DiscoveryResolver {
    async fn resolve_service_instance(&self, request: &Url) -> Url {
        self.lookup_service(request).await
    }
}

/// Builder for [`DiscoveryResolver`].
#[derive(Default)]
pub struct DiscoveryResolverBuilder {
    provider: Option<Arc<dyn ServiceInstanceProvider>>,
    selector: Option<Arc<dyn InstanceSelector>>,
}

impl DiscoveryResolverBuilder {
    pub fn provider(mut self, provider: impl ServiceInstanceProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn ServiceInstanceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn selector(mut self, selector: impl InstanceSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Fails when no provider was supplied; the selector defaults to
    /// [`RandomSelector`].
    pub fn build(self) -> Result<DiscoveryResolver> {
        let provider = self
            .provider
            .ok_or(LoadBalancerError::MissingCollaborator("service instance provider"))?;

        Ok(DiscoveryResolver {
            provider,
            selector: self.selector.unwrap_or_else(|| Arc::new(RandomSelector)),
        })
    }
}
