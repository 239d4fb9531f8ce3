//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runner.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the request runner.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    /// Inbound HTTP server settings.
    pub server: ServerConfig,

    /// Validation and execution limits for outbound calls.
    pub runner: LimitsConfig,

    /// Shared outbound connection pool settings.
    pub transport: TransportConfig,

    /// SSRF policy overrides.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Inbound server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Budget for one inbound call, in seconds. Acts as the caller deadline
    /// for the outbound call, so it must exceed `runner.max_timeout_ms`.
    pub request_timeout_secs: u64,

    /// Maximum size of an inbound request description in bytes.
    pub max_body_bytes: usize,

    /// Allow cross-origin calls from browser clients.
    pub cors_enabled: bool,

    /// Time allowed for in-flight calls to drain on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 95,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            cors_enabled: true,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Limits applied by the validator and executor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Timeout used when the caller asks for 0 ms.
    pub default_timeout_ms: u64,

    /// Hard ceiling; larger requested timeouts are rejected.
    pub max_timeout_ms: u64,

    /// Response bodies are truncated after this many bytes.
    pub max_response_bytes: usize,

    /// Upper bound on the validation-time DNS lookup.
    pub dns_timeout_ms: u64,

    /// HTTP methods callers may use.
    pub allowed_methods: Vec<String>,

    /// Headers stripped from every outbound call (matched case-insensitively).
    pub blocked_headers: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_timeout_ms: 90_000,
            max_response_bytes: 10 * 1024 * 1024, // 10MB
            dns_timeout_ms: 5_000,
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            blocked_headers: [
                "Authorization",
                "Cookie",
                "Proxy-Authorization",
                "X-Forwarded-For",
            ]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        }
    }
}

/// Outbound transport (connection pool) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Maximum idle connections kept per origin.
    pub max_idle_per_host: usize,

    /// Idle pooled connections are closed after this many seconds.
    pub idle_timeout_secs: u64,

    /// TCP connect plus TLS handshake timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum redirects followed for one call.
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 100,
            idle_timeout_secs: 90,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// SSRF policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hosts (names or IP literals, exact match) exempt from the
    /// private-address check. Empty in production.
    pub trusted_hosts: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
