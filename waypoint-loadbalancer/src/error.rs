//! Load balancer error types.

use thiserror::Error;

/// Result type for load balancer construction.
pub type Result<T> = std::result::Result<T, LoadBalancerError>;

/// Errors surfaced when wiring a balancer or resolver.
///
/// Resolution itself never fails: runtime problems degrade to returning the
/// original URI.
#[derive(Debug, Error)]
pub enum LoadBalancerError {
    /// A mandatory dependency was not supplied.
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// A configuration value is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
