//! Service instances and the contracts that enumerate them

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Service discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Invalid service instance: {0}")]
    InvalidInstance(String),

    #[error("Discovery backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One concrete, directly routable endpoint of a logical service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Logical service name this instance belongs to
    pub service_id: String,

    /// Unique id of the instance; defaults to `host:port`
    #[serde(default)]
    pub instance_id: String,

    /// Host name or IP address
    pub host: String,

    /// Port number
    pub port: u16,

    /// Whether the instance is reached over https
    #[serde(default, alias = "is_secure")]
    pub secure: bool,

    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    /// Create a plain-http instance
    pub fn new(service_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            service_id: service_id.into(),
            instance_id: format!("{}:{}", host, port),
            host,
            port,
            secure: false,
            metadata: HashMap::new(),
        }
    }

    /// Set an explicit instance id
    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    /// Mark the instance as served over https
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// URI scheme of the instance
    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// Base URI (`scheme://host:port`) of the instance.
    ///
    /// The host must be a bare host name or address; anything that would
    /// spill into a path, query or userinfo is rejected.
    pub fn uri(&self) -> Result<Url, DiscoveryError> {
        let invalid = |reason: &str| {
            DiscoveryError::InvalidInstance(format!("{}:{}: {}", self.host, self.port, reason))
        };

        let mut uri = Url::parse(&format!("{}://placeholder", self.scheme()))
            .map_err(|e| invalid(&e.to_string()))?;

        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        uri.set_host(Some(&host)).map_err(|e| invalid(&e.to_string()))?;
        uri.set_port(Some(self.port)).map_err(|_| invalid("port cannot be set"))?;

        Ok(uri)
    }

    /// Fill in a missing instance id
    pub(crate) fn normalized(mut self) -> Self {
        if self.instance_id.is_empty() {
            self.instance_id = format!("{}:{}", self.host, self.port);
        }
        self
    }
}

/// Read contract consumed by load balancers.
///
/// Returns the current ordered instances of a logical service. Unknown
/// services yield an empty list rather than an error.
#[async_trait]
pub trait ServiceInstanceProvider: Send + Sync {
    /// Current instances registered under `service_id`
    async fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance>;
}

#[async_trait]
impl<P> ServiceInstanceProvider for Arc<P>
where
    P: ServiceInstanceProvider + ?Sized,
{
    async fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        (**self).get_instances(service_id).await
    }
}

/// Registry backend that can be queried for instances and may fail doing so.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Discover instances by service name
    async fn discover(&self, service_id: &str) -> Result<Vec<ServiceInstance>, DiscoveryError>;

    /// List all known service names
    async fn list_services(&self) -> Result<Vec<String>, DiscoveryError>;
}

/// Registry backend that accepts registrations.
#[async_trait]
pub trait ServiceRegistry: ServiceDiscovery {
    /// Register (or replace) an instance
    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError>;

    /// Remove an instance by its instance id
    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError>;
}

/// Adapts a fallible [`ServiceDiscovery`] backend into a [`ServiceInstanceProvider`].
///
/// Backend failures are logged and reported as an empty instance list.
pub struct DiscoveryInstanceProvider<D: ServiceDiscovery> {
    discovery: D,
}

impl<D: ServiceDiscovery> DiscoveryInstanceProvider<D> {
    /// Wrap a discovery backend
    pub fn new(discovery: D) -> Self {
        Self { discovery }
    }

    /// Get the wrapped backend
    pub fn discovery(&self) -> &D {
        &self.discovery
    }
}

#[async_trait]
impl<D: ServiceDiscovery> ServiceInstanceProvider for DiscoveryInstanceProvider<D> {
    async fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        match self.discovery.discover(service_id).await {
            Ok(instances) => instances,
            Err(e) => {
                warn!(
                    service = service_id,
                    error = %e,
                    "Service discovery failed, no instances available"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingDiscovery;

    #[async_trait]
    impl ServiceDiscovery for FailingDiscovery {
        async fn discover(&self, service_id: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
            Err(DiscoveryError::ServiceNotFound(service_id.to_string()))
        }

        async fn list_services(&self) -> Result<Vec<String>, DiscoveryError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_service_instance() {
        let instance = ServiceInstance::new("fruitservice", "fruitball", 8000)
            .with_secure(true)
            .with_metadata("zone", "eu-1");

        assert_eq!(instance.instance_id, "fruitball:8000");
        assert_eq!(instance.scheme(), "https");
        assert_eq!(instance.uri().unwrap().as_str(), "https://fruitball:8000/");
        assert_eq!(instance.metadata.get("zone").map(String::as_str), Some("eu-1"));
    }

    #[test]
    fn test_default_port_is_normalized_away() {
        let instance = ServiceInstance::new("api", "localhost", 80);
        let uri = instance.uri().unwrap();
        assert_eq!(uri.port(), None);
        assert_eq!(uri.port_or_known_default(), Some(80));
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let instance = ServiceInstance::new("api", "::1", 9000);
        assert_eq!(instance.uri().unwrap().as_str(), "http://[::1]:9000/");
    }

    #[test]
    fn test_invalid_host() {
        let instance = ServiceInstance::new("api", "bad host", 9000);
        assert!(matches!(instance.uri(), Err(DiscoveryError::InvalidInstance(_))));
    }

    #[test]
    fn test_host_with_path_is_rejected() {
        for host in ["10.0.0.1/evil", "fruitball?x=1", "user@fruitball", "fruitball#top"] {
            let instance = ServiceInstance::new("api", host, 8000);
            assert!(
                matches!(instance.uri(), Err(DiscoveryError::InvalidInstance(_))),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn test_host_case_is_normalized() {
        let instance = ServiceInstance::new("api", "FruitBall", 8000);
        assert_eq!(instance.uri().unwrap().as_str(), "http://fruitball:8000/");
    }

    #[tokio::test]
    async fn test_failing_discovery_yields_empty_list() {
        let provider = DiscoveryInstanceProvider::new(FailingDiscovery);
        assert!(provider.get_instances("api").await.is_empty());
    }
}
