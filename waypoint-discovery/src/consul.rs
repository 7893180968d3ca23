//! Consul-backed instance discovery (read-only)

use crate::service::{DiscoveryError, ServiceDiscovery, ServiceInstance};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Consul service discovery client
pub struct ConsulDiscovery {
    base_url: Url,
    client: reqwest::Client,
    passing_only: bool,
}

#[derive(Deserialize)]
struct ConsulHealthEntry {
    #[serde(rename = "Node")]
    node: ConsulNode,
    #[serde(rename = "Service")]
    service: ConsulService,
}

#[derive(Deserialize)]
struct ConsulNode {
    #[serde(rename = "Address")]
    address: String,
}

#[derive(Deserialize)]
struct ConsulService {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Service")]
    service: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Tags", default)]
    tags: Option<Vec<String>>,
    #[serde(rename = "Meta", default)]
    meta: Option<HashMap<String, String>>,
}

impl ConsulHealthEntry {
    fn into_instance(self) -> ServiceInstance {
        let service = self.service;
        let meta = service.meta.unwrap_or_default();
        let tags = service.tags.unwrap_or_default();

        let secure = tags.iter().any(|t| t == "secure")
            || meta.get("secure").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        // An empty service address means "same as the node"
        let host = if service.address.is_empty() {
            self.node.address
        } else {
            service.address
        };

        let mut instance = ServiceInstance::new(service.service, host, service.port)
            .with_instance_id(service.id)
            .with_secure(secure);
        instance.metadata = meta;
        instance
    }
}

impl ConsulDiscovery {
    /// Create new Consul discovery client
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waypoint_discovery::ConsulDiscovery;
    ///
    /// let consul = ConsulDiscovery::new("http://localhost:8500").unwrap();
    /// ```
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, DiscoveryError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| DiscoveryError::InvalidConfiguration(format!("Consul URL: {}", e)))?;

        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
            passing_only: true,
        })
    }

    /// Include instances whose health checks are failing
    pub fn include_unhealthy(mut self) -> Self {
        self.passing_only = false;
        self
    }

    /// Append `segments` to the base URL, keeping any path prefix
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DiscoveryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DiscoveryError::InvalidConfiguration(format!(
                    "Consul URL cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn backend_error(response: reqwest::Response) -> DiscoveryError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        DiscoveryError::Backend { status, message }
    }
}

#[async_trait]
impl ServiceDiscovery for ConsulDiscovery {
    async fn discover(&self, service_id: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let url = self.endpoint(&["v1", "health", "service", service_id])?;

        let mut request = self.client.get(url);
        if self.passing_only {
            request = request.query(&[("passing", "true")]);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let entries: Vec<ConsulHealthEntry> = response.json().await?;
        let instances: Vec<ServiceInstance> =
            entries.into_iter().map(ConsulHealthEntry::into_instance).collect();

        debug!(
            service = service_id,
            count = instances.len(),
            "Discovered instances from Consul"
        );
        Ok(instances)
    }

    async fn list_services(&self) -> Result<Vec<String>, DiscoveryError> {
        let url = self.endpoint(&["v1", "catalog", "services"])?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }

        let services: HashMap<String, Vec<String>> = response.json().await?;
        let mut names: Vec<String> = services.into_keys().collect();
        names.sort();
        Ok(names)
    }
}
