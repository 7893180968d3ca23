//! In-memory service registry

use crate::service::{
    DiscoveryError, ServiceDiscovery, ServiceInstance, ServiceInstanceProvider, ServiceRegistry,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory service registry (for testing/development).
///
/// Instances keep their registration order; re-registering an instance id
/// replaces it in place.
#[derive(Clone, Default)]
pub struct InMemoryDiscovery {
    instances: Arc<RwLock<Vec<ServiceInstance>>>,
}

impl InMemoryDiscovery {
    /// Create new in-memory registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with instances
    pub fn with_instances(instances: impl IntoIterator<Item = ServiceInstance>) -> Self {
        Self {
            instances: Arc::new(RwLock::new(
                instances.into_iter().map(ServiceInstance::normalized).collect(),
            )),
        }
    }

    /// Clear all registered instances
    pub async fn clear(&self) {
        self.instances.write().await.clear();
    }

    /// Get count of registered instances
    pub async fn count(&self) -> usize {
        self.instances.read().await.len()
    }
}

#[async_trait]
impl ServiceDiscovery for InMemoryDiscovery {
    async fn discover(&self, service_id: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self
            .instances
            .read()
            .await
            .iter()
            .filter(|i| i.service_id == service_id)
            .cloned()
            .collect())
    }

    async fn list_services(&self) -> Result<Vec<String>, DiscoveryError> {
        let instances = self.instances.read().await;
        let mut names: Vec<String> = instances.iter().map(|i| i.service_id.clone()).collect();

        names.sort();
        names.dedup();

        Ok(names)
    }
}

#[async_trait]
impl ServiceRegistry for InMemoryDiscovery {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), DiscoveryError> {
        let instance = instance.clone().normalized();
        let mut instances = self.instances.write().await;

        match instances.iter_mut().find(|i| i.instance_id == instance.instance_id) {
            Some(existing) => *existing = instance,
            None => instances.push(instance),
        }
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError> {
        let mut instances = self.instances.write().await;
        let position = instances
            .iter()
            .position(|i| i.instance_id == instance_id)
            .ok_or_else(|| DiscoveryError::ServiceNotFound(instance_id.to_string()))?;

        instances.remove(position);
        Ok(())
    }
}

#[async_trait]
impl ServiceInstanceProvider for InMemoryDiscovery {
    async fn get_instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        // discover() on this registry cannot fail
        self.discover(service_id).await.unwrap_or_default()
    }
}
