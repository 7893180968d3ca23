//! The load balancer contract and URI rewriting

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use waypoint_discovery::{DiscoveryError, ServiceInstance};

/// Resolves logical service URIs to concrete instance URIs.
///
/// The host of a request URI is read as a logical service name. Resolution
/// never fails: when no instance can be chosen the request URI is returned
/// unchanged so the caller can still attempt it.
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    /// Rewrite `request` to point at one instance of its service.
    async fn resolve_service_instance(&self, request: &Url) -> Url;

    /// Report the outcome of a request dispatched to `resolved`.
    ///
    /// Positional strategies ignore this; it is the hook for strategies that
    /// weigh instances by latency or failures.
    async fn update_stats(
        &self,
        _original: &Url,
        _resolved: &Url,
        _response_time: Duration,
        _error: Option<&(dyn StdError + Send + Sync)>,
    ) {
    }
}

#[async_trait]
impl<L> LoadBalancer for Arc<L>
where
    L: LoadBalancer + ?Sized,
{
    async fn resolve_service_instance(&self, request: &Url) -> Url {
        (**self).resolve_service_instance(request).await
    }

    async fn update_stats(
        &self,
        original: &Url,
        resolved: &Url,
        response_time: Duration,
        error: Option<&(dyn StdError + Send + Sync)>,
    ) {
        (**self)
            .update_stats(original, resolved, response_time, error)
            .await
    }
}

/// Rebuild `request` against `instance`, carrying over path and query.
///
/// Scheme, host and port come from the instance; userinfo and fragment of
/// the request are dropped. Path and query are re-serialized under the
/// instance's scheme, so a request with a non-special scheme such as
/// `lb://` may come back with extra percent-encoding (`q='x'` becomes
/// `q=%27x%27` under http). The decoded values are unchanged.
pub fn rewrite_uri(request: &Url, instance: &ServiceInstance) -> Result<Url, DiscoveryError> {
    let mut resolved = instance.uri()?;
    resolved.set_path(request.path());
    resolved.set_query(request.query());
    Ok(resolved)
}

/// [`rewrite_uri`], falling back to the request when the instance is unusable.
pub(crate) fn rewrite_or_passthrough(request: &Url, instance: &ServiceInstance) -> Url {
    match rewrite_uri(request, instance) {
        Ok(resolved) => {
            debug!(
                service = %instance.service_id,
                instance = %instance.instance_id,
                resolved = %resolved,
                "Resolved service instance"
            );
            resolved
        }
        Err(e) => {
            warn!(
                service = %instance.service_id,
                instance = %instance.instance_id,
                error = %e,
                "Selected instance has no usable address, leaving request unresolved"
            );
            request.clone()
        }
    }
}
