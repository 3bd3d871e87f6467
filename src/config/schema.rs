//! Configuration schema definitions.
//!
//! All types derive `Deserialize` for deserialization from config files.

use serde::Deserialize;

/// Root configuration for the forwarder.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Listener configuration (bind address, local prefix).
    pub listener: ListenerConfig,

    /// The upstream origin requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Optional upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Local path prefix under which requests are forwarded (e.g., "/api").
    pub prefix: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            prefix: "/api".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Backend origin, e.g. "https://api.example.com".
    pub origin: String,

    /// Append the inbound query string to the upstream URL.
    pub preserve_query: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            preserve_query: false,
        }
    }
}

/// Upstream timeouts. Unset means no deadline beyond the transport's own.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Total upstream request timeout in seconds.
    pub upstream_secs: Option<u64>,
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024, // payment proof uploads
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
