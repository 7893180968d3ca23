//! Waypoint Logging
//!
//! Every Waypoint crate emits its diagnostics through [`tracing`]. Resolution
//! fallbacks (no instances, unreachable rotation cache) are reported at
//! `warn`/`error`, selections at `debug` and discovery lookups at `trace`.
//! This crate installs a subscriber configured from the environment.
//!
//! # Usage
//!
//! ```rust,no_run
//! waypoint_log::init();
//!
//! tracing::info!(service = "fruitservice", "balancer ready");
//! ```
//!
//! # Environment Variables
//!
//! - `WAYPOINT_DEBUG=1` - Enable debug logging
//! - `WAYPOINT_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `WAYPOINT_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `WAYPOINT_LOG_COLOR=1|0` - Enable/disable ANSI colors
//!
//! `RUST_LOG`, when set, takes precedence over `WAYPOINT_LOG_LEVEL`.

use once_cell::sync::Lazy;
use std::env;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

// ============================================================================
// Log Levels
// ============================================================================

/// Minimum level of emitted diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Parse a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Filter directive understood by [`EnvFilter`].
    pub fn as_directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_directive().to_uppercase())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable output
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Parse a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether ANSI colors are enabled
    pub color: bool,
    /// Whether to include the event target (module path)
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Json,
            color: false,
            target: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };

        let debug = flag("WAYPOINT_DEBUG").unwrap_or(false);

        let level = lookup("WAYPOINT_LOG_LEVEL")
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("WAYPOINT_LOG_FORMAT")
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Json);

        let color = flag("WAYPOINT_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        let target = flag("WAYPOINT_LOG_TARGET").unwrap_or(true);

        Self {
            level,
            format,
            // JSON output never carries escape codes
            color: color && format != Format::Json,
            target,
        }
    }

    /// Build the filter: `RUST_LOG` wins, then the configured level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_directive()))
    }
}

/// Get the process-wide configuration read from the environment.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

// ============================================================================
// Subscriber installation
// ============================================================================

/// Error returned when a global subscriber is already installed.
#[derive(Debug)]
pub struct InitError(tracing_subscriber::util::TryInitError);

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to install log subscriber: {}", self.0)
    }
}

impl std::error::Error for InitError {}

/// Install the global subscriber for the given configuration.
pub fn try_init_with(config: &LogConfig) -> Result<(), InitError> {
    let registry = tracing_subscriber::registry().with(config.filter());
    let fmt = tracing_subscriber::fmt::layer()
        .with_ansi(config.color)
        .with_target(config.target)
        .with_writer(std::io::stderr);

    let result = match config.format {
        Format::Pretty => registry.with(fmt.pretty()).try_init(),
        Format::Compact => registry.with(fmt.compact()).try_init(),
        #[cfg(feature = "json")]
        Format::Json => registry.with(fmt.json()).try_init(),
        #[cfg(not(feature = "json"))]
        Format::Json => registry.with(fmt.compact()).try_init(),
    };

    result.map_err(InitError)
}

/// Install the global subscriber configured from the environment.
pub fn try_init() -> Result<(), InitError> {
    try_init_with(config())
}

/// Install the global subscriber, ignoring a previously installed one.
pub fn init() {
    let _ = try_init();
}
