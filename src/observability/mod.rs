//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP boundary and runner produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a call
//! - Outcome logging belongs to the HTTP boundary, not the runner core

pub mod logging;
pub mod metrics;
