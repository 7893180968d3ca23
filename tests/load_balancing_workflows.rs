//! Integration tests for common Waypoint workflows.
//!
//! These tests wire the crates together the way an application would.

use std::sync::Arc;
use url::Url;
use waypoint::prelude::*;
use waypoint::waypoint_cache::CacheError;

const PRODUCE: &str = r#"
[[services]]
service_id = "fruitservice"
host = "fruitball"
port = 8000
secure = true

[[services]]
service_id = "fruitservice"
host = "fruitballer"
port = 8001

[[services]]
service_id = "fruitservice"
host = "fruitballerz"
port = 8002

[[services]]
service_id = "vegetableservice"
host = "vegemite"
port = 8010
is_secure = true

[[services]]
service_id = "vegetableservice"
host = "carrot"
port = 8011

[[services]]
service_id = "vegetableservice"
host = "beet"
port = 8012
"#;

fn produce() -> ConfigurationServiceInstanceProvider {
    ConfigurationServiceInstanceProvider::from_toml_str(PRODUCE).unwrap()
}

fn uri(s: &str) -> Url {
    Url::parse(s).unwrap()
}

// =============================================================================
// Distributed round-robin
// =============================================================================

#[tokio::test]
async fn test_distributed_resolves_and_increments_service_index() {
    let cache = Arc::new(InMemoryCache::new());
    let balancer = LoadBalancerBuilder::new(LoadBalancerConfig::new(
        LoadBalancerStrategy::DistributedRoundRobin,
    ))
    .provider(produce())
    .shared_cache(cache.clone())
    .build()
    .unwrap();

    let fruit = balancer.resolve_service_instance(&uri("http://fruitservice/api")).await;
    balancer.resolve_service_instance(&uri("http://vegetableservice/api")).await;
    let veg = balancer.resolve_service_instance(&uri("http://vegetableservice/api")).await;

    assert_eq!(fruit.as_str(), "https://fruitball:8000/api");
    assert_eq!(veg.as_str(), "http://carrot:8011/api");

    assert_eq!(
        cache.get("fruitserviceLoadBalancerIndex").await.unwrap(),
        Some(1u32.to_le_bytes().to_vec())
    );
    assert_eq!(
        cache.get("vegetableserviceLoadBalancerIndex").await.unwrap(),
        Some(2u32.to_le_bytes().to_vec())
    );
}

#[tokio::test]
async fn test_replicas_share_one_rotation() {
    let cache: Arc<dyn DistributedCache> = Arc::new(InMemoryCache::new());
    let replicas: Vec<_> = (0..3)
        .map(|_| RoundRobinDistributedLoadBalancer::new(produce(), cache.clone()))
        .collect();

    let mut hosts = Vec::new();
    for replica in replicas.iter().cycle().take(6) {
        let resolved = replica.resolve_service_instance(&uri("http://fruitservice/")).await;
        hosts.push(resolved.host_str().unwrap().to_string());
    }

    assert_eq!(
        hosts,
        ["fruitball", "fruitballer", "fruitballerz", "fruitball", "fruitballer", "fruitballerz"]
    );
}

#[tokio::test]
async fn test_cache_outage_does_not_fail_resolution() {
    struct Down;

    #[async_trait::async_trait]
    impl DistributedCache for Down {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Timeout)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
            Err(CacheError::Timeout)
        }

        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Timeout)
        }
    }

    let balancer = RoundRobinDistributedLoadBalancer::new(produce(), Down);
    let resolved = balancer
        .resolve_service_instance(&uri("http://vegetableservice/soup?salt=low"))
        .await;

    assert_eq!(resolved.as_str(), "https://vegemite:8010/soup?salt=low");
}

// =============================================================================
// Runtime instance changes
// =============================================================================

#[tokio::test]
async fn test_updated_configuration_is_picked_up() {
    let provider = produce();
    let balancer = RoundRobinLoadBalancer::new(provider.clone());
    let request = uri("http://fruitservice/api");

    balancer.resolve_service_instance(&request).await;
    balancer.resolve_service_instance(&request).await;

    // Scale fruitservice down to a single new instance
    provider.update(vec![ServiceInstance::new("fruitservice", "fruitbowl", 9000)]);

    let resolved = balancer.resolve_service_instance(&request).await;
    assert_eq!(resolved.as_str(), "http://fruitbowl:9000/api");
    assert_eq!(balancer.store().current("fruitservice"), Some(1));
}

#[tokio::test]
async fn test_registry_backed_balancer() {
    let registry = InMemoryDiscovery::new();
    let balancer = LoadBalancerBuilder::default()
        .strategy(LoadBalancerStrategy::RoundRobin)
        .provider(registry.clone())
        .build()
        .unwrap();
    let request = uri("http://orderservice/orders/7");

    // Nothing registered yet
    assert_eq!(balancer.resolve_service_instance(&request).await, request);

    registry
        .register(&ServiceInstance::new("orderservice", "10.0.0.5", 7000))
        .await
        .unwrap();
    assert_eq!(
        balancer.resolve_service_instance(&request).await.as_str(),
        "http://10.0.0.5:7000/orders/7"
    );
}

// =============================================================================
// Discovery resolver
// =============================================================================

#[tokio::test]
async fn test_resolver_mixes_logical_and_literal_uris() {
    let resolver = DiscoveryResolver::builder()
        .provider(produce())
        .build()
        .unwrap();

    let logical = resolver.lookup_service(&uri("http://fruitservice/api")).await;
    assert!(matches!(logical.host_str(), Some("fruitball" | "fruitballer" | "fruitballerz")));

    let literal = uri("http://fruitservice:5555/api");
    assert_eq!(resolver.lookup_service(&literal).await, literal);
}

// =============================================================================
// HTTP client
// =============================================================================

#[cfg(feature = "http-client")]
#[tokio::test]
async fn test_http_client_reaches_discovered_instance() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("sort", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("kiwi"))
        .expect(2)
        .mount(&server)
        .await;

    let addr = server.address();
    let provider = ConfigurationServiceInstanceProvider::new(vec![ServiceInstance::new(
        "fruitservice",
        addr.ip().to_string(),
        addr.port(),
    )]);
    let balancer = LoadBalancerBuilder::new(LoadBalancerConfig::new(
        LoadBalancerStrategy::DistributedRoundRobin,
    ))
    .provider(provider)
    .cache(InMemoryCache::new())
    .build()
    .unwrap();

    let client = LoadBalancedClient::new(HttpClientConfig::default())
        .unwrap()
        .with_middleware(LoadBalancerMiddleware::from_shared(balancer));

    for _ in 0..2 {
        let response = client.get("http://fruitservice/api/items?sort=desc").await.unwrap();
        assert_eq!(response.text().unwrap(), "kiwi");
    }
}
