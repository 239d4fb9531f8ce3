//! Request policy compiled once from configuration.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::header::HeaderName;
use reqwest::Method;

use crate::config::LimitsConfig;

/// Immutable allow/deny sets and limits shared by every run.
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    pub allowed_methods: HashSet<Method>,
    pub blocked_headers: HashSet<HeaderName>,
    pub default_timeout: Duration,
    pub max_timeout: Duration,
    pub max_response_bytes: usize,
    pub dns_timeout: Duration,
}

impl RequestPolicy {
    /// Entries that fail to parse are skipped; `validate_config` reports them
    /// before a config is accepted.
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            allowed_methods: config
                .allowed_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
                .collect(),
            blocked_headers: config
                .blocked_headers
                .iter()
                .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
                .collect(),
            default_timeout: Duration::from_millis(config.default_timeout_ms),
            max_timeout: Duration::from_millis(config.max_timeout_ms),
            max_response_bytes: config.max_response_bytes,
            dns_timeout: Duration::from_millis(config.dns_timeout_ms),
        }
    }
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self::from_config(&LimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_sets() {
        let policy = RequestPolicy::default();
        assert_eq!(policy.allowed_methods.len(), 7);
        assert!(policy.allowed_methods.contains(&Method::PATCH));
        assert!(!policy.allowed_methods.contains(&Method::TRACE));
        assert!(policy.blocked_headers.contains(&HeaderName::from_static("x-forwarded-for")));
        assert_eq!(policy.default_timeout, Duration::from_secs(30));
        assert_eq!(policy.max_timeout, Duration::from_secs(90));
    }

    #[test]
    fn config_names_are_canonicalized() {
        let config = LimitsConfig {
            allowed_methods: vec!["get".into()],
            blocked_headers: vec!["X-Api-Key".into()],
            ..LimitsConfig::default()
        };
        let policy = RequestPolicy::from_config(&config);
        assert!(policy.allowed_methods.contains(&Method::GET));
        assert!(policy.blocked_headers.contains(&HeaderName::from_static("x-api-key")));
    }
}
