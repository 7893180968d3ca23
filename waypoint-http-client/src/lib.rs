//! # Waypoint HTTP Client
//!
//! Outbound HTTP with client-side load balancing. Requests address a logical
//! service (`http://fruitservice/basket`); a middleware rewrites the URL to a
//! concrete instance before the transport runs and reports the outcome back
//! to the balancer afterwards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waypoint_cache::InMemoryCache;
//! use waypoint_discovery::ConsulDiscovery;
//! use waypoint_http_client::{HttpClientConfig, LoadBalancedClient, LoadBalancerMiddleware};
//! use waypoint_loadbalancer::{LoadBalancerBuilder, LoadBalancerStrategy};
//! use waypoint_discovery::DiscoveryInstanceProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let consul = ConsulDiscovery::new("http://localhost:8500")?;
//!     let balancer = LoadBalancerBuilder::default()
//!         .strategy(LoadBalancerStrategy::DistributedRoundRobin)
//!         .provider(DiscoveryInstanceProvider::new(consul))
//!         .cache(InMemoryCache::new())
//!         .build()?;
//!
//!     let client = LoadBalancedClient::new(HttpClientConfig::default())?
//!         .with_middleware(LoadBalancerMiddleware::from_shared(balancer));
//!
//!     let response = client.get("http://fruitservice/basket?ripe=true").await?;
//!     println!("{} from {}", response.status(), response.url());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod load_balancer;
mod middleware;
mod response;

pub use client::LoadBalancedClient;
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use load_balancer::{DiscoveryMiddleware, LoadBalancerMiddleware};
pub use middleware::{Middleware, MiddlewareChain, TimeoutMiddleware};
pub use response::Response;

pub use http::{HeaderMap, Method, StatusCode};
pub use url::Url;
