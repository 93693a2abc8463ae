//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Forward proxy and target endpoints.
    pub upstream: UpstreamConfig,

    /// Outbound connection settings.
    pub transport: TransportConfig,

    /// Logging, diagnostics and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8083").
    pub bind_address: String,

    /// Maximum concurrent inbound connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8083".to_string(),
            max_connections: 10_000,
        }
    }
}

/// How the outbound `Host` header is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HostHeaderPolicy {
    /// Drop the inbound header; the client derives it from the target URL.
    #[default]
    Target,
    /// Force the header to the forward proxy's `host[:port]`.
    Proxy,
}

/// Upstream endpoints. Both are required, usually from the command line.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Forward proxy base URL (e.g., "http://proxy-host:3128").
    pub proxy_url: String,

    /// Target base URL (e.g., "http://host:port/base/path?query").
    pub target_url: String,

    /// Outbound `Host` header policy.
    pub host_header: HostHeaderPolicy,
}

/// Outbound transport configuration.
///
/// Timeouts are in seconds; 0 disables the timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Reuse upstream connections across requests.
    pub keep_alive: bool,

    /// Maximum concurrent connections to the target.
    pub max_conns_per_host: usize,

    /// Maximum idle pooled connections when `keep_alive` is on.
    pub max_idle_per_host: usize,

    /// TCP keep-alive probe interval.
    pub tcp_keepalive_secs: u64,

    /// Connection establishment timeout (proxy dial, CONNECT, TLS).
    pub connect_timeout_secs: u64,

    /// Total request timeout, including the response body.
    pub request_timeout_secs: u64,

    /// Idle pooled connection timeout.
    pub idle_timeout_secs: u64,

    /// Skip TLS certificate verification of the target.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            keep_alive: false,
            max_conns_per_host: 100,
            max_idle_per_host: 100,
            tcp_keepalive_secs: 10,
            connect_timeout_secs: 30,
            request_timeout_secs: 0,
            idle_timeout_secs: 90,
            accept_invalid_certs: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Dump outbound requests and log non-200 responses.
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
