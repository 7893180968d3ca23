//! Client-side load balancing for Waypoint.
//!
//! A request addressed to a logical service, such as
//! `http://fruitservice/api/items?page=2`, is rewritten to one concrete
//! instance of that service, such as `http://fruitball:8000/api/items?page=2`.
//! The scheme, host and port come from the chosen
//! [`ServiceInstance`](waypoint_discovery::ServiceInstance); path and query
//! are kept.
//!
//! ## Strategies
//!
//! - [`RandomLoadBalancer`] - uniformly random instance, no state
//! - [`RoundRobinLoadBalancer`] - rotation kept in process
//! - [`RoundRobinDistributedLoadBalancer`] - rotation kept in a
//!   [`DistributedCache`](waypoint_cache::DistributedCache) shared by replicas
//!
//! [`DiscoveryResolver`] resolves only URIs on their scheme's default port and
//! passes literal `host:port` addresses through.
//!
//! Resolution never fails. When a service has no instances the request URI
//! is returned unchanged and a diagnostic is logged.
//!
//! ## Example
//!
//! ```
//! use url::Url;
//! use waypoint_discovery::{InMemoryDiscovery, ServiceInstance};
//! use waypoint_loadbalancer::{LoadBalancer, RoundRobinLoadBalancer};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let discovery = InMemoryDiscovery::with_instances([
//!     ServiceInstance::new("fruitservice", "fruitball", 8000),
//!     ServiceInstance::new("fruitservice", "fruitballer", 8001),
//! ]);
//! let balancer = RoundRobinLoadBalancer::new(discovery);
//!
//! let request = Url::parse("http://fruitservice/api?ripe=true").unwrap();
//! let resolved = balancer.resolve_service_instance(&request).await;
//! assert_eq!(resolved.as_str(), "http://fruitball:8000/api?ripe=true");
//! # }
//! ```

pub mod balancer;
pub mod config;
pub mod distributed;
pub mod error;
pub mod random;
pub mod resolver;
pub mod rotation;
pub mod round_robin;

pub use balancer::{LoadBalancer, rewrite_uri};
pub use config::{LoadBalancerBuilder, LoadBalancerConfig, LoadBalancerStrategy};
pub use distributed::RoundRobinDistributedLoadBalancer;
pub use error::{LoadBalancerError, Result};
pub use random::RandomLoadBalancer;
pub use resolver::{
    DiscoveryResolver, DiscoveryResolverBuilder, FirstSelector, InstanceSelector, RandomSelector,
};
pub use rotation::{CacheRotationStore, InMemoryRotationStore, RotationStore};
pub use round_robin::RoundRobinLoadBalancer;
