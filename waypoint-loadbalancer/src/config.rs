//! Balancer configuration and construction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use waypoint_cache::DistributedCache;
use waypoint_discovery::ServiceInstanceProvider;

use crate::balancer::LoadBalancer;
use crate::distributed::RoundRobinDistributedLoadBalancer;
use crate::error::{LoadBalancerError, Result};
use crate::random::RandomLoadBalancer;
use crate::rotation::DEFAULT_KEY_SUFFIX;
use crate::round_robin::RoundRobinLoadBalancer;

/// Instance selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerStrategy {
    /// Uniformly random instance (default)
    #[default]
    Random,
    /// Per-process rotation
    RoundRobin,
    /// Rotation shared through a distributed cache
    DistributedRoundRobin,
}

impl LoadBalancerStrategy {
    /// Whether the strategy needs a [`DistributedCache`]
    pub fn requires_cache(&self) -> bool {
        matches!(self, Self::DistributedRoundRobin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::RoundRobin => "round_robin",
            Self::DistributedRoundRobin => "distributed_round_robin",
        }
    }
}

impl fmt::Display for LoadBalancerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load balancer configuration.
///
/// ```
/// use waypoint_loadbalancer::{LoadBalancerConfig, LoadBalancerStrategy};
///
/// let config: LoadBalancerConfig =
///     serde_json::from_str(r#"{ "strategy": "round_robin" }"#).unwrap();
/// assert_eq!(config.strategy, LoadBalancerStrategy::RoundRobin);
/// assert_eq!(config.cache_key_suffix, "LoadBalancerIndex");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub strategy: LoadBalancerStrategy,
    /// Appended to the service name to form the shared rotation key
    pub cache_key_suffix: String,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            strategy: LoadBalancerStrategy::default(),
            cache_key_suffix: DEFAULT_KEY_SUFFIX.to_string(),
        }
    }
}

impl LoadBalancerConfig {
    pub fn new(strategy: LoadBalancerStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_cache_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.cache_key_suffix = suffix.into();
        self
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> Result<()> {
        if self.strategy.requires_cache() && self.cache_key_suffix.is_empty() {
            return Err(LoadBalancerError::InvalidConfiguration(
                "cache_key_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wires a strategy to its collaborators.
///
/// ```
/// use waypoint_discovery::InMemoryDiscovery;
/// use waypoint_loadbalancer::{LoadBalancerBuilder, LoadBalancerConfig, LoadBalancerStrategy};
///
/// let config = LoadBalancerConfig::new(LoadBalancerStrategy::RoundRobin);
/// let balancer = LoadBalancerBuilder::new(config)
///     .provider(InMemoryDiscovery::new())
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct LoadBalancerBuilder {
    config: LoadBalancerConfig,
    provider: Option<Arc<dyn ServiceInstanceProvider>>,
    cache: Option<Arc<dyn DistributedCache>>,
}

impl LoadBalancerBuilder {
    pub fn new(config: LoadBalancerConfig) -> Self {
        Self {
            config,
            provider: None,
            cache: None,
        }
    }

    pub fn strategy(mut self, strategy: LoadBalancerStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn provider(mut self, provider: impl ServiceInstanceProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: Arc<dyn ServiceInstanceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Shared cache for the distributed strategy; ignored by the others
    pub fn cache(mut self, cache: impl DistributedCache + 'static) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn shared_cache(mut self, cache: Arc<dyn DistributedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the configured balancer.
    ///
    /// A provider is always required; the distributed strategy also needs a
    /// cache.
    pub fn build(self) -> Result<Arc<dyn LoadBalancer>> {
        self.config.validate()?;

        let provider = self
            .provider
            .ok_or(LoadBalancerError::MissingCollaborator("service instance provider"))?;

        let balancer: Arc<dyn LoadBalancer> = match self.config.strategy {
            LoadBalancerStrategy::Random => Arc::new(RandomLoadBalancer::new(provider)),
            LoadBalancerStrategy::RoundRobin => Arc::new(RoundRobinLoadBalancer::new(provider)),
            LoadBalancerStrategy::DistributedRoundRobin => {
                let cache = self
                    .cache
                    .ok_or(LoadBalancerError::MissingCollaborator("distributed cache"))?;
                Arc::new(RoundRobinDistributedLoadBalancer::with_key_suffix(
                    provider,
                    cache,
                    self.config.cache_key_suffix,
                ))
            }
        };

        tracing::debug!(strategy = %self.config.strategy, "Built load balancer");
        Ok(balancer)
    }
}
