// Waypoint - client-side load balancing for logical service URIs
//
// This library resolves requests addressed to a service name into requests
// addressed to one of that service's running instances.

// Re-export the balancing core
pub use waypoint_loadbalancer::*;

// Re-export collaborator crates
pub use waypoint_cache;
pub use waypoint_discovery;
pub use waypoint_loadbalancer;

#[cfg(feature = "http-client")]
pub use waypoint_http_client;

#[cfg(feature = "log")]
pub use waypoint_log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        DiscoveryResolver,
        LoadBalancer,
        LoadBalancerBuilder,
        LoadBalancerConfig,
        LoadBalancerError,
        LoadBalancerStrategy,
        RandomLoadBalancer,
        RoundRobinDistributedLoadBalancer,
        RoundRobinLoadBalancer,
    };

    // Cache types
    pub use waypoint_cache::{CacheConfig, DistributedCache, InMemoryCache};
    #[cfg(feature = "redis")]
    pub use waypoint_cache::RedisCache;

    // Discovery types
    pub use waypoint_discovery::{
        ConfigurationServiceInstanceProvider, ConsulDiscovery, DiscoveryInstanceProvider,
        InMemoryDiscovery, ServiceDiscovery, ServiceInstance, ServiceInstanceProvider,
        ServiceRegistry,
    };

    #[cfg(feature = "http-client")]
    pub use waypoint_http_client::{
        DiscoveryMiddleware, HttpClientConfig, LoadBalancedClient, LoadBalancerMiddleware,
    };
}
