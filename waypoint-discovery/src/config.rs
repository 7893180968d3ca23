//! Instances declared in application configuration
//!
//! ```toml
//! [[services]]
//! service_id = "fruitservice"
//! host = "fruitball"
//! port = 8000
//! secure = true
//! ```

use crate::service::{DiscoveryError, ServiceInstance, ServiceInstanceProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }
}

/// Configuration document listing service instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstancesConfig {
    #[serde(default)]
    pub services: Vec<ServiceInstance>,
}

impl ServiceInstancesConfig {
    /// Parse a configuration document
    pub fn parse(content: &str, format: FileFormat) -> Result<Self, DiscoveryError> {
        match format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| DiscoveryError::Parse(format!("JSON parse error: {}", e))),
            FileFormat::Toml => toml::from_str(content)
                .map_err(|e| DiscoveryError::Parse(format!("TOML parse error: {}", e))),
        }
    }

    /// Load a configuration file, detecting the format from its extension
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                DiscoveryError::InvalidConfiguration("No file extension found".to_string())
            })?;

        let format = FileFormat::from_extension(ext).ok_or_else(|| {
            DiscoveryError::InvalidConfiguration(format!("Unsupported format: {}", ext))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }
}

/// Provider serving instances declared in configuration.
///
/// The instance set can be swapped at runtime with [`update`](Self::update),
/// e.g. when the configuration file is reloaded.
#[derive(Clone, Default)]
pub struct ConfigurationServiceInstanceProvider {
    instances: Arc<RwLock<Vec<ServiceInstance>>>,
}

impl ConfigurationServiceInstanceProvider {
    /// Create a provider from a list of instances
    pub fn new(instances: Vec<ServiceInstance>) -> Self {
        let provider = Self::default();
        provider.update(instances);
        provider
    }

    /// Create a provider from a parsed configuration document
    pub fn from_config(config: ServiceInstancesConfig) -> Self {
        Self::new(config.services)
    }

    /// Create a provider from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, DiscoveryError> {
        ServiceInstancesConfig::parse(content, FileFormat::Json).map(Self::from_config)
    }

    /// Create a provider from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, DiscoveryError> {
        ServiceInstancesConfig::parse(content, FileFormat::Toml).map(Self::from_config)
    }

    /// Create a provider from a `.json` or `.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        ServiceInstancesConfig::load_file(path).map(Self::from_config)
    }

    /// Replace the configured instances
    pub fn update(&self, instances: Vec<ServiceInstance>) {
        *self.instances.write() = instances.into_iter().map(ServiceInstance::normalized).collect();
    }

    /// Snapshot of every configured instance
    pub fn instances(&self) -> Vec<ServiceInstance> {
        self.instances.read().clone()
    }
}

#[async_trait]
impl ServiceInstanceProvider for ConfigurationServiceInstanceProvider {
    async fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        self.instances
            .read()
            .iter()
            .filter(|i| i.service_id == service_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML: &str = r#"
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
        service_id = "vegetableservice"
        host = "vegemite"
        port = 8010
    "#;

    #[tokio::test]
    async fn test_parse_toml() {
        let provider = ConfigurationServiceInstanceProvider::from_toml_str(TOML).unwrap();

        let fruit = provider.get_instances("fruitservice").await;
        assert_eq!(fruit.len(), 2);
        assert!(fruit[0].secure);
        assert_eq!(fruit[0].instance_id, "fruitball:8000");
        assert_eq!(fruit[1].port, 8001);

        assert!(provider.get_instances("unknown").await.is_empty());
    }

    #[tokio::test]
    async fn test_parse_json_with_alias() {
        let json = r#"{"services": [
            {"service_id": "api", "host": "10.0.0.1", "port": 9000,
             "is_secure": true, "instance_id": "api-1"}
        ]}"#;
        let provider = ConfigurationServiceInstanceProvider::from_json_str(json).unwrap();

        let instances = provider.get_instances("api").await;
        assert_eq!(instances[0].instance_id, "api-1");
        assert!(instances[0].secure);
    }

    #[test]
    fn test_parse_error() {
        let result = ConfigurationServiceInstanceProvider::from_json_str("{not json");
        assert!(matches!(result, Err(DiscoveryError::Parse(_))));
    }

    #[tokio::test]
    async fn test_from_file_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TOML.as_bytes()).unwrap();

        let provider = ConfigurationServiceInstanceProvider::from_file(file.path()).unwrap();
        assert_eq!(provider.instances().len(), 3);

        let unsupported = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigurationServiceInstanceProvider::from_file(unsupported.path());
        assert!(matches!(result, Err(DiscoveryError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_update_replaces_instances() {
        let provider = ConfigurationServiceInstanceProvider::new(vec![ServiceInstance::new(
            "api", "one", 1000,
        )]);

        provider.update(vec![
            ServiceInstance::new("api", "two", 2000),
            ServiceInstance::new("api", "three", 3000),
        ]);

        let hosts: Vec<String> = provider
            .get_instances("api")
            .await
            .into_iter()
            .map(|i| i.host)
            .collect();
        assert_eq!(hosts, vec!["two", "three"]);
    }
}
