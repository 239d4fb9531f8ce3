//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the API handlers
//! - Wire up middleware (request ID, body limit, CORS, tracing)
//! - Bind the server to a listener and drain on shutdown
//! - Hand request descriptions to the runner under the inbound budget
//! - Log and count every outcome

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, Method, Request};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{RunnerConfig, ServerConfig};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::net::HostResolver;
use crate::observability::metrics;
use crate::runner::{CallContext, NormalizedResponse, RequestDescription, RequestRunner, RunnerError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: RequestRunner,
    /// Caller deadline applied to every run.
    pub request_budget: Duration,
}

/// HTTP front door of the runner.
pub struct HttpServer {
    router: Router,
    config: RunnerConfig,
}

impl HttpServer {
    /// Build the runner and router from `config`.
    pub fn new(config: RunnerConfig, resolver: Arc<dyn HostResolver>) -> Result<Self, reqwest::Error> {
        let runner = RequestRunner::from_config(&config, resolver)?;
        let state = AppState {
            runner,
            request_budget: Duration::from_secs(config.server.request_timeout_secs),
        };

        let router = build_router(&config.server, state);
        Ok(Self { router, config })
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then stop accepting and
    /// wait for in-flight calls.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/api/v1/request", post(run_request))
        .route("/api/v1/healthcheck", get(healthcheck))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes));

    let router = if config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn healthcheck() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Validate and execute one request description.
async fn run_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RequestDescription>, JsonRejection>,
) -> Result<Json<NormalizedResponse>, ApiError> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let Json(description) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection.body_text(), "Unreadable request description");
            metrics::record_run("none", "invalid_input", start);
            return Err(rejection.into());
        }
    };

    let method = method_label(&description.method);
    let ctx = CallContext::with_timeout(state.request_budget);

    match state.runner.run(&ctx, description).await {
        Ok(response) => {
            let degradation = response.error().unwrap_or_default();
            tracing::info!(
                request_id = %request_id,
                method = method,
                status = response.status_code,
                size = response.size,
                duration_ms = response.duration.as_millis() as u64,
                degradation = %degradation,
                "Request completed"
            );
            let outcome = if response.is_degraded() { "degraded" } else { "ok" };
            metrics::record_run(method, outcome, start);
            metrics::record_response_size(response.size);
            Ok(Json(response))
        }
        Err(err) => {
            match &err {
                RunnerError::InvalidInput(_) => {
                    tracing::warn!(request_id = %request_id, method = method, error = %err, "Request rejected")
                }
                _ => tracing::error!(request_id = %request_id, method = method, error = %err, "Request failed"),
            }
            metrics::record_run(method, err.kind(), start);
            Err(err.into())
        }
    }
}

/// Bounded metric label for a caller-supplied method.
fn method_label(method: &str) -> &'static str {
    const KNOWN: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];
    KNOWN
        .iter()
        .find(|m| m.eq_ignore_ascii_case(method))
        .copied()
        .unwrap_or("OTHER")
}
