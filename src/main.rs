//! Request runner service.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                 REQUEST RUNNER                  │
//!                     │                                                 │
//!   POST /api/v1/     │  ┌────────┐   ┌───────────┐   ┌────────────┐   │
//!   request  ─────────┼─▶│  http  │──▶│ validator │──▶│  executor  │───┼──▶ Target
//!                     │  │ server │   │ (+ SSRF)  │   │ (pooled)   │   │    Server
//!   JSON reply        │  │        │   └───────────┘   └─────┬──────┘   │
//!   ◀─────────────────┼──│        │◀────────────────────────┘          │
//!                     │  └────────┘                                     │
//!                     │                                                 │
//!                     │  config · observability · lifecycle · security  │
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use request_runner::config::{load_config, RunnerConfig};
use request_runner::http::HttpServer;
use request_runner::lifecycle::{shutdown, signals, Shutdown};
use request_runner::net::SystemResolver;
use request_runner::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-runner")]
#[command(about = "Runs caller-described HTTP requests behind an SSRF guard", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "request-runner starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        default_timeout_ms = config.runner.default_timeout_ms,
        max_timeout_ms = config.runner.max_timeout_ms,
        max_response_bytes = config.runner.max_response_bytes,
        trusted_hosts = config.security.trusted_hosts.len(),
        "Configuration loaded"
    );
    if !config.security.trusted_hosts.is_empty() {
        tracing::warn!(hosts = ?config.security.trusted_hosts, "SSRF check disabled for trusted hosts");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let server = HttpServer::new(config, Arc::new(SystemResolver))?;

    let shutdown = Shutdown::new();
    let drain = shutdown::drain_deadline(shutdown.subscribe(), grace);
    let serve = server.run(listener, shutdown.subscribe());
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    tokio::select! {
        result = serve => result?,
        _ = drain => tracing::warn!(grace_secs = grace.as_secs(), "Drain timeout elapsed, dropping in-flight calls"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
