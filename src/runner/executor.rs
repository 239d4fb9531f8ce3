//! Outbound request execution.
//!
//! # Responsibilities
//! - Own the shared connection pool (built once, cloned by handle)
//! - Run one vetted request under the earlier of its own timeout and the
//!   caller deadline
//! - Read at most `max_response_bytes` of the body and normalize the result
//!
//! # Design Decisions
//! - Exactly one attempt per call; no retries or backoff
//! - Deadline expiry before the status line and headers arrive is a `Timeout`,
//!   distinct from other transport failures
//! - Once headers are in, the call succeeds: an oversized body, an unreadable
//!   body or a deadline hit mid-body is tagged with a [`Degradation`]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use tokio::time::Instant;

use crate::config::TransportConfig;
use crate::net::HostResolver;
use crate::runner::context::CallContext;
use crate::runner::error::{error_chain, RunnerError};
use crate::runner::types::{Degradation, NormalizedResponse};
use crate::runner::validator::VettedRequest;
use crate::security::ssrf::{redirect_policy, AddressPolicy, GuardedResolver};

/// Executes vetted requests over a shared, pooled HTTP client.
#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    max_response_bytes: usize,
}

impl RequestExecutor {
    /// Build the executor and its connection pool.
    pub fn new(
        transport: &TransportConfig,
        max_response_bytes: usize,
        addresses: Arc<AddressPolicy>,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(transport.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(transport.idle_timeout_secs))
            .connect_timeout(Duration::from_secs(transport.connect_timeout_secs))
            .dns_resolver(Arc::new(GuardedResolver::new(resolver, Arc::clone(&addresses))))
            .redirect(redirect_policy(addresses, transport.max_redirects))
            .no_proxy()
            .build()?;

        tracing::debug!(
            max_idle_per_host = transport.max_idle_per_host,
            idle_timeout_secs = transport.idle_timeout_secs,
            connect_timeout_secs = transport.connect_timeout_secs,
            "Outbound connection pool ready"
        );

        Ok(Self {
            client,
            max_response_bytes,
        })
    }

    pub fn max_response_bytes(&self) -> usize {
        self.max_response_bytes
    }

    /// Perform the single outbound call described by `request`.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: VettedRequest,
    ) -> Result<NormalizedResponse, RunnerError> {
        let timestamp = Utc::now();
        let started = Instant::now();

        let (method, target, headers, body, timeout) = request.into_parts();
        let deadline = ctx.bounded(started, timeout);

        let mut outbound = self.client.request(method, target).headers(headers);
        if !body.is_empty() {
            outbound = outbound.body(body);
        }

        let response = match tokio::time::timeout_at(deadline, outbound.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(RunnerError::execution(&e)),
            Err(_) => {
                return Err(RunnerError::Timeout(deadline.saturating_duration_since(started)));
            }
        };

        Ok(self.normalize(response, started, timestamp, deadline).await)
    }

    async fn normalize(
        &self,
        mut response: Response,
        started: Instant,
        timestamp: chrono::DateTime<Utc>,
        deadline: Instant,
    ) -> NormalizedResponse {
        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let (body, degradation) = read_capped(&mut response, self.max_response_bytes, deadline).await;

        NormalizedResponse {
            status_code,
            duration: started.elapsed(),
            timestamp,
            size: body.len(),
            headers,
            body,
            degradation,
        }
    }
}

/// Group header values by lowercase name, in arrival order. Values are
/// reported as text: bytes that are not UTF-8 become U+FFFD.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut collected: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

/// Read the body chunk by chunk, keeping at most `limit` bytes. A read
/// failure or an expired deadline keeps nothing.
async fn read_capped(
    response: &mut Response,
    limit: usize,
    deadline: Instant,
) -> (Vec<u8>, Option<Degradation>) {
    // Content-Length is not trusted; the cap applies to bytes actually read.
    let mut body = Vec::new();

    loop {
        let chunk = match tokio::time::timeout_at(deadline, response.chunk()).await {
            Ok(chunk) => chunk,
            Err(_) => {
                tracing::debug!(read = body.len(), "Deadline expired during body read");
                return (Vec::new(), Some(Degradation::BodyRead("deadline exceeded".into())));
            }
        };

        match chunk {
            Ok(Some(chunk)) => {
                let remaining = limit - body.len();
                if chunk.len() > remaining {
                    body.extend_from_slice(&chunk[..remaining]);
                    return (body, Some(Degradation::Truncated { limit }));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => return (body, None),
            Err(e) => {
                let reason = error_chain(&e);
                tracing::debug!(error = %reason, "Response body read failed");
                return (Vec::new(), Some(Degradation::BodyRead(reason)));
            }
        }
    }
}
