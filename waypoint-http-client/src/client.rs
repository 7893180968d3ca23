//! Load-balanced HTTP client.

use reqwest::{IntoUrl, Method, Request};
use std::sync::Arc;
use tracing::debug;
use waypoint_loadbalancer::{DiscoveryResolver, LoadBalancer};

use crate::{
    DiscoveryMiddleware, HttpClientConfig, HttpClientError, LoadBalancerMiddleware, Middleware,
    MiddlewareChain, Response, Result,
};

/// A `reqwest` client whose requests pass through a middleware chain.
///
/// Requests may name a logical service as their host once a
/// [`LoadBalancerMiddleware`] or [`DiscoveryMiddleware`] is installed.
///
/// ```no_run
/// use waypoint_discovery::{InMemoryDiscovery, ServiceInstance};
/// use waypoint_http_client::{HttpClientConfig, LoadBalancedClient};
/// use waypoint_loadbalancer::RoundRobinLoadBalancer;
///
/// # async fn run() -> waypoint_http_client::Result<()> {
/// let discovery = InMemoryDiscovery::with_instances([
///     ServiceInstance::new("fruitservice", "10.0.0.7", 8000),
/// ]);
/// let client = LoadBalancedClient::new(HttpClientConfig::default())?
///     .with_load_balancer(RoundRobinLoadBalancer::new(discovery));
///
/// let response = client.get("http://fruitservice/basket").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LoadBalancedClient {
    inner: reqwest::Client,
    chain: MiddlewareChain,
    config: Arc<HttpClientConfig>,
}

impl LoadBalancedClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.gzip)
            .build()
            .map_err(|e| HttpClientError::ClientBuild(e.to_string()))?;

        Ok(Self {
            chain: MiddlewareChain::new(inner.clone()),
            inner,
            config: Arc::new(config),
        })
    }

    /// Resolve every request through `balancer`
    pub fn with_load_balancer(self, balancer: impl LoadBalancer + 'static) -> Self {
        self.with_middleware(LoadBalancerMiddleware::new(balancer))
    }

    /// Resolve default-port requests through `resolver`
    pub fn with_discovery(self, resolver: DiscoveryResolver) -> Self {
        self.with_middleware(DiscoveryMiddleware::new(resolver))
    }

    pub fn with_middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.chain = self.chain.with_middleware(middleware);
        self
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Start a request; send it with [`send`](Self::send).
    pub fn request(&self, method: Method, url: impl IntoUrl) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    pub async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response> {
        self.execute(builder.build()?).await
    }

    pub async fn get(&self, url: impl IntoUrl) -> Result<Response> {
        let url = url
            .into_url()
            .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
        self.execute(Request::new(Method::GET, url)).await
    }

    pub async fn execute(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "Executing request");
        self.chain.execute(request).await
    }
}
