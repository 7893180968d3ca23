//! Load-balancing middleware.

use async_trait::async_trait;
use reqwest::Request;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use waypoint_loadbalancer::{DiscoveryResolver, LoadBalancer};

use crate::{Middleware, MiddlewareChain, Response, Result};

/// Rewrites each request through a [`LoadBalancer`] and reports the outcome.
///
/// After the rest of the chain completes, the balancer's `update_stats` is
/// called with the elapsed time and the error, if the request failed.
pub struct LoadBalancerMiddleware {
    balancer: Arc<dyn LoadBalancer>,
}

impl LoadBalancerMiddleware {
    pub fn new(balancer: impl LoadBalancer + 'static) -> Self {
        Self {
            balancer: Arc::new(balancer),
        }
    }

    pub fn from_shared(balancer: Arc<dyn LoadBalancer>) -> Self {
        Self { balancer }
    }
}

#[async_trait]
impl Middleware for LoadBalancerMiddleware {
    async fn handle(&self, mut request: Request, next: &MiddlewareChain) -> Result<Response> {
        let original = request.url().clone();
        let resolved = self.balancer.resolve_service_instance(&original).await;
        debug!(original = %original, resolved = %resolved, "Dispatching load-balanced request");
        *request.url_mut() = resolved.clone();

        let start = Instant::now();
        let result = next.next(request).await;
        let elapsed = start.elapsed();

        let error = result
            .as_ref()
            .err()
            .map(|e| e as &(dyn StdError + Send + Sync));
        self.balancer
            .update_stats(&original, &resolved, elapsed, error)
            .await;

        result
    }
}

/// Rewrites each request through a [`DiscoveryResolver`].
///
/// Requests already carrying an explicit port go out untouched.
pub struct DiscoveryMiddleware {
    resolver: DiscoveryResolver,
}

impl DiscoveryMiddleware {
    pub fn new(resolver: DiscoveryResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Middleware for DiscoveryMiddleware {
    async fn handle(&self, mut request: Request, next: &MiddlewareChain) -> Result<Response> {
        let resolved = self.resolver.lookup_service(request.url()).await;
        *request.url_mut() = resolved;
        next.next(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use reqwest::Method;
    use std::time::Duration;
    use url::Url;
    use waypoint_discovery::{InMemoryDiscovery, ServiceInstance};
    use waypoint_loadbalancer::RoundRobinLoadBalancer;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Clone)]
    struct Report {
        original: Url,
        resolved: Url,
        failed: bool,
    }

    /// Round-robin balancer that records every stats report
    struct Recording {
        inner: RoundRobinLoadBalancer<InMemoryDiscovery>,
        reports: Mutex<Vec<Report>>,
    }

    #[async_trait]
    impl LoadBalancer for Recording {
        async fn resolve_service_instance(&self, request: &Url) -> Url {
            self.inner.resolve_service_instance(request).await
        }

        async fn update_stats(
            &self,
            original: &Url,
            resolved: &Url,
            _response_time: Duration,
            error: Option<&(dyn StdError + Send + Sync)>,
        ) {
            self.reports.lock().push(Report {
                original: original.clone(),
                resolved: resolved.clone(),
                failed: error.is_some(),
            });
        }
    }

    fn recording(instance: ServiceInstance) -> Arc<Recording> {
        Arc::new(Recording {
            inner: RoundRobinLoadBalancer::new(InMemoryDiscovery::with_instances([instance])),
            reports: Mutex::new(Vec::new()),
        })
    }

    async fn fruit_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basket"))
            .and(query_param("ripe", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("apples"))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_request_reaches_resolved_instance() {
        let server = fruit_server().await;
        let addr = server.address();
        let balancer = recording(ServiceInstance::new(
            "fruitservice",
            addr.ip().to_string(),
            addr.port(),
        ));

        let chain = MiddlewareChain::new(reqwest::Client::new())
            .with_middleware(LoadBalancerMiddleware::from_shared(balancer.clone()));

        let original = Url::parse("http://fruitservice/basket?ripe=true").unwrap();
        let response = chain
            .execute(Request::new(Method::GET, original.clone()))
            .await
            .unwrap();

        assert_eq!(response.text().unwrap(), "apples");
        assert_eq!(response.url().port(), Some(addr.port()));

        let reports = balancer.reports.lock().clone();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].original, original);
        assert_eq!(reports[0].resolved.as_str(), response.url().as_str());
        assert!(!reports[0].failed);
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        // Nothing listens on the discard port
        let balancer = recording(ServiceInstance::new("fruitservice", "127.0.0.1", 9));
        let chain = MiddlewareChain::new(reqwest::Client::new())
            .with_middleware(LoadBalancerMiddleware::from_shared(balancer.clone()));

        let result = chain
            .execute(Request::new(Method::GET, Url::parse("http://fruitservice/").unwrap()))
            .await;

        assert!(result.is_err());
        let reports = balancer.reports.lock().clone();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].failed);
        assert_eq!(reports[0].resolved.as_str(), "http://127.0.0.1:9/");
    }

    #[tokio::test]
    async fn test_discovery_middleware() {
        let server = fruit_server().await;
        let addr = server.address();
        let discovery = InMemoryDiscovery::with_instances([ServiceInstance::new(
            "fruitservice",
            addr.ip().to_string(),
            addr.port(),
        )]);

        let chain = MiddlewareChain::new(reqwest::Client::new())
            .with_middleware(DiscoveryMiddleware::new(DiscoveryResolver::new(discovery)));

        let response = chain
            .execute(Request::new(
                Method::GET,
                Url::parse("http://fruitservice/basket?ripe=true").unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(response.text().unwrap(), "apples");
    }

    #[tokio::test]
    async fn test_discovery_middleware_leaves_literal_address() {
        let server = fruit_server().await;
        let resolver = DiscoveryResolver::new(InMemoryDiscovery::new());
        let chain = MiddlewareChain::new(reqwest::Client::new())
            .with_middleware(DiscoveryMiddleware::new(resolver));

        let literal = Url::parse(&format!("{}/basket?ripe=true", server.uri())).unwrap();
        let response = chain.execute(Request::new(Method::GET, literal)).await.unwrap();

        assert!(response.is_success());
    }
}
