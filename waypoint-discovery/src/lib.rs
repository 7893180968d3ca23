//! Service instance providers for Waypoint
//!
//! Load balancers only need one thing from discovery: the current, ordered
//! list of instances behind a logical service name. This crate defines that
//! read contract ([`ServiceInstanceProvider`]) and ships the providers a
//! deployment typically wires in.
//!
//! ## Providers
//!
//! - **[`InMemoryDiscovery`]** - mutable registry, for tests and development
//! - **[`ConfigurationServiceInstanceProvider`]** - instances declared in JSON/TOML
//! - **[`ConsulDiscovery`]** - healthy instances from a Consul agent, wrapped
//!   in [`DiscoveryInstanceProvider`]
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint_discovery::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DiscoveryError> {
//! let registry = InMemoryDiscovery::new();
//! registry.register(&ServiceInstance::new("fruitservice", "fruitball", 8000)).await?;
//!
//! let instances = registry.get_instances("fruitservice").await;
//! assert_eq!(instances[0].uri()?.as_str(), "http://fruitball:8000/");
//! # Ok(())
//! # }
//! ```
//!
//! ### Consul
//!
//! ```rust,ignore
//! use waypoint_discovery::*;
//!
//! let provider = DiscoveryInstanceProvider::new(ConsulDiscovery::new("http://localhost:8500")?);
//! let instances = provider.get_instances("fruitservice").await;
//! ```

pub mod config;
pub mod consul;
pub mod memory;
pub mod service;

pub use config::{ConfigurationServiceInstanceProvider, FileFormat, ServiceInstancesConfig};
pub use consul::ConsulDiscovery;
pub use memory::InMemoryDiscovery;
pub use service::{
    DiscoveryError, DiscoveryInstanceProvider, ServiceDiscovery, ServiceInstance,
    ServiceInstanceProvider, ServiceRegistry,
};
