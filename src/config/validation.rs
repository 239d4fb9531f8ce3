//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ordering between limits)
//! - Check that method and header names are legal HTTP tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RunnerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use reqwest::header::HeaderName;
use reqwest::Method;
use thiserror::Error;

use crate::config::schema::RunnerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("runner.default_timeout_ms ({default_ms}) exceeds runner.max_timeout_ms ({max_ms})")]
    DefaultAboveMax { default_ms: u64, max_ms: u64 },

    #[error("server.request_timeout_secs ({budget_secs}s) must exceed runner.max_timeout_ms ({max_ms}ms)")]
    BudgetTooSmall { budget_secs: u64, max_ms: u64 },

    #[error("runner.allowed_methods must not be empty")]
    NoMethods,

    #[error("invalid HTTP method in runner.allowed_methods: {0:?}")]
    InvalidMethod(String),

    #[error("invalid header name in runner.blocked_headers: {0:?}")]
    InvalidHeader(String),

    #[error("{field} is not a socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &RunnerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let limits = &config.runner;

    for (field, value) in [
        ("runner.default_timeout_ms", limits.default_timeout_ms),
        ("runner.max_timeout_ms", limits.max_timeout_ms),
        ("runner.dns_timeout_ms", limits.dns_timeout_ms),
        ("runner.max_response_bytes", limits.max_response_bytes as u64),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("server.max_body_bytes", config.server.max_body_bytes as u64),
        ("transport.connect_timeout_secs", config.transport.connect_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if limits.default_timeout_ms > limits.max_timeout_ms {
        errors.push(ValidationError::DefaultAboveMax {
            default_ms: limits.default_timeout_ms,
            max_ms: limits.max_timeout_ms,
        });
    }

    if config.server.request_timeout_secs.saturating_mul(1000) <= limits.max_timeout_ms {
        errors.push(ValidationError::BudgetTooSmall {
            budget_secs: config.server.request_timeout_secs,
            max_ms: limits.max_timeout_ms,
        });
    }

    if limits.allowed_methods.is_empty() {
        errors.push(ValidationError::NoMethods);
    }
    for method in &limits.allowed_methods {
        if Method::from_bytes(method.to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for header in &limits.blocked_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader(header.clone()));
        }
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
