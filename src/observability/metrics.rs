//! Metrics collection and exposition.
//!
//! # Metrics
//! - `runner_requests_total` (counter): runs by method and outcome
//! - `runner_request_duration_seconds` (histogram): run latency by outcome
//! - `runner_response_bytes` (histogram): retained body size
//!
//! Updates are no-ops until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one run.
pub fn record_run(method: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "runner_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("runner_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_response_size(bytes: usize) {
    metrics::histogram!("runner_response_bytes").record(bytes as f64);
}
