//! Request validation and normalization.
//!
//! # Responsibilities
//! - Turn an untrusted [`RequestDescription`] into a [`VettedRequest`]
//! - Reject unknown methods, bad URLs, non-http(s) schemes, private targets
//!   and out-of-range timeouts
//! - Strip deny-listed headers
//!
//! # Design Decisions
//! - `VettedRequest` has private fields and no public constructor; this
//!   module is the only place one can be built
//! - Every address a host resolves to is checked, not just the first
//! - The only I/O is the DNS lookup, bounded by `dns_timeout` and the caller
//!   deadline

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::Instant;
use reqwest::Method;
use url::{Host, Url};

use crate::net::HostResolver;
use crate::runner::context::CallContext;
use crate::runner::error::RunnerError;
use crate::runner::policy::RequestPolicy;
use crate::runner::types::RequestDescription;
use crate::security::headers::filter_headers;
use crate::security::AddressPolicy;

/// An outbound request that passed every validation check.
#[derive(Debug, Clone)]
pub struct VettedRequest {
    method: Method,
    target: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    timeout: Duration,
}

impl VettedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn into_parts(self) -> (Method, Url, HeaderMap, Vec<u8>, Duration) {
        (self.method, self.target, self.headers, self.body, self.timeout)
    }
}

/// Validates request descriptions against the configured policies.
#[derive(Clone)]
pub struct RequestValidator {
    policy: Arc<RequestPolicy>,
    addresses: Arc<AddressPolicy>,
    resolver: Arc<dyn HostResolver>,
}

impl RequestValidator {
    pub fn new(
        policy: Arc<RequestPolicy>,
        addresses: Arc<AddressPolicy>,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            policy,
            addresses,
            resolver,
        }
    }

    /// Validate a description, resolving its host once. The lookup is bounded
    /// by the earlier of `dns_timeout` and the caller deadline.
    pub async fn validate(
        &self,
        ctx: &CallContext,
        description: RequestDescription,
    ) -> Result<VettedRequest, RunnerError> {
        let method = self.check_method(&description.method)?;
        let target = check_url(&description.url)?;
        self.check_target(ctx, &target).await?;
        let timeout = self.resolve_timeout(description.timeout)?;

        let headers = filter_headers(&description.headers, &self.policy.blocked_headers)
            .map_err(RunnerError::invalid)?;
        let body = description.body_bytes().map_err(RunnerError::invalid)?;

        Ok(VettedRequest {
            method,
            target,
            headers,
            body,
            timeout,
        })
    }

    fn check_method(&self, raw: &str) -> Result<Method, RunnerError> {
        let upper = raw.to_ascii_uppercase();
        Method::from_bytes(upper.as_bytes())
            .ok()
            .filter(|m| self.policy.allowed_methods.contains(m))
            .ok_or_else(|| RunnerError::invalid(format!("invalid or unsupported HTTP method: {upper}")))
    }

    async fn check_target(&self, ctx: &CallContext, target: &Url) -> Result<(), RunnerError> {
        let host = target
            .host()
            .ok_or_else(|| RunnerError::invalid("URL has no host"))?;

        let domain = match host {
            Host::Domain(domain) => domain,
            literal => {
                return self
                    .addresses
                    .check_literal(&literal)
                    .map_err(|e| RunnerError::invalid(e.to_string()));
            }
        };

        if self.addresses.is_trusted(domain) {
            return Ok(());
        }

        let started = Instant::now();
        let dns_deadline = started + self.policy.dns_timeout;
        let deadline = ctx.bounded(started, self.policy.dns_timeout);

        let ips = match tokio::time::timeout_at(deadline, self.resolver.lookup(domain)).await {
            Ok(result) => {
                result.map_err(|e| RunnerError::invalid(format!("could not resolve hostname: {e}")))?
            }
            // The caller ran out of time before the lookup budget did.
            Err(_) if deadline < dns_deadline => {
                return Err(RunnerError::Timeout(deadline.saturating_duration_since(started)));
            }
            Err(_) => return Err(RunnerError::invalid("could not resolve hostname: lookup timed out")),
        };
        if ips.is_empty() {
            return Err(RunnerError::invalid("could not resolve hostname: no addresses"));
        }

        self.addresses
            .check_addresses(domain, &ips)
            .map_err(|e| RunnerError::invalid(e.to_string()))
    }

    fn resolve_timeout(&self, requested_ms: i64) -> Result<Duration, RunnerError> {
        let timeout = if requested_ms <= 0 {
            self.policy.default_timeout
        } else {
            Duration::from_millis(requested_ms as u64)
        };

        if timeout > self.policy.max_timeout {
            return Err(RunnerError::invalid(format!(
                "timeout of {}ms exceeds the maximum allowed limit of {}ms",
                timeout.as_millis(),
                self.policy.max_timeout.as_millis()
            )));
        }
        Ok(timeout)
    }
}

fn check_url(raw: &str) -> Result<Url, RunnerError> {
    if raw.is_empty() {
        return Err(RunnerError::invalid("URL cannot be empty"));
    }
    let url = Url::parse(raw).map_err(|e| RunnerError::invalid(format!("failed to parse URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RunnerError::invalid(format!(
            "invalid URL scheme: {other}. Only 'http' and 'https' are allowed"
        ))),
    }
}
