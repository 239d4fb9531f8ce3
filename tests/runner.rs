//! End-to-end runs against mock origins on loopback.

mod common;

use std::time::{Duration, Instant};

use chrono::Utc;
use request_runner::runner::{CallContext, Degradation, RequestDescription, RunnerError};

use common::*;

fn url(addr: std::net::SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

#[tokio::test]
async fn echo_round_trip_strips_blocked_headers() {
    let origin = start_echo_origin().await;
    let runner = runner(&test_config());
    let before = Utc::now();

    let description = RequestDescription::new("post", url(origin, "/submit"))
        .header("Authorization", "Bearer secret")
        .header("cookie", "session=1")
        .header("X-Custom", "kept")
        .text_body("hello");

    let response = runner
        .run(&CallContext::background(), description)
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, b"hello");
    assert_eq!(response.size, 5);
    assert!(response.degradation.is_none());
    assert!(response.timestamp >= before);
    assert!(response.duration > Duration::ZERO);

    assert_eq!(response.headers["x-echo-method"], vec!["POST"]);
    assert_eq!(response.headers["x-echo-x-custom"], vec!["kept"]);
    assert!(!response.headers.contains_key("x-echo-authorization"));
    assert!(!response.headers.contains_key("x-echo-cookie"));
}

#[tokio::test]
async fn multi_value_headers_keep_order() {
    let origin = start_echo_origin().await;
    let runner = runner(&test_config());

    let description = RequestDescription::new("GET", url(origin, "/"))
        .header("X-Multi", "first")
        .header("X-Multi", "second");

    let response = runner
        .run(&CallContext::background(), description)
        .await
        .unwrap();

    assert_eq!(response.headers["x-echo-x-multi"], vec!["first", "second"]);
}

#[tokio::test]
async fn oversized_body_is_truncated_at_limit() {
    let origin = start_sized_origin(4096).await;
    let mut config = test_config();
    config.runner.max_response_bytes = 1024;
    let runner = runner(&config);

    let response = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.size, 1024);
    assert_eq!(response.body.len(), 1024);
    assert_eq!(response.degradation, Some(Degradation::Truncated { limit: 1024 }));
    assert!(response.error().unwrap().contains("1024"));
}

#[tokio::test]
async fn body_at_exact_limit_is_complete() {
    let origin = start_sized_origin(1024).await;
    let mut config = test_config();
    config.runner.max_response_bytes = 1024;
    let runner = runner(&config);

    let response = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap();

    assert_eq!(response.size, 1024);
    assert!(!response.is_degraded());
}

#[tokio::test]
async fn head_has_empty_body() {
    let origin = start_sized_origin(4096).await;
    let runner = runner(&test_config());

    let response = runner
        .run(&CallContext::background(), RequestDescription::new("HEAD", url(origin, "/")))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty());
    assert_eq!(response.size, 0);
    assert!(!response.is_degraded());
}

#[tokio::test]
async fn unreadable_body_is_a_degraded_success() {
    let origin = start_broken_origin().await;
    let runner = runner(&test_config());

    let response = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.size, 0);
    assert!(matches!(response.degradation, Some(Degradation::BodyRead(_))));
}

#[tokio::test]
async fn slow_origin_times_out() {
    let origin = start_slow_origin(Duration::from_secs(5)).await;
    let runner = runner(&test_config());
    let start = Instant::now();

    let description = RequestDescription::new("GET", url(origin, "/")).timeout_ms(200);
    let err = runner
        .run(&CallContext::background(), description)
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Timeout(_)), "got {err:?}");
    assert!(err.to_string().contains("200ms"));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn deadline_during_body_read_keeps_status_and_headers() {
    let origin = start_stalling_origin().await;
    let runner = runner(&test_config());
    let start = Instant::now();

    let description = RequestDescription::new("GET", url(origin, "/")).timeout_ms(300);
    let response = runner
        .run(&CallContext::background(), description)
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["x-seen"], vec!["yes"]);
    assert_eq!(response.size, 0);
    assert!(response.duration >= Duration::from_millis(300));
    let note = response.error().unwrap();
    assert!(note.starts_with("failed to read response body"), "{note}");
    assert!(note.contains("deadline exceeded"), "{note}");
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn caller_deadline_cuts_a_longer_timeout() {
    let origin = start_slow_origin(Duration::from_secs(5)).await;
    let runner = runner(&test_config());
    let start = Instant::now();

    let description = RequestDescription::new("GET", url(origin, "/")).timeout_ms(10_000);
    let err = runner
        .run(&CallContext::with_timeout(Duration::from_millis(150)), description)
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Timeout(_)), "got {err:?}");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn refused_connection_is_an_execution_error() {
    let addr = closed_port().await;
    let runner = runner(&test_config());

    let err = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(addr, "/")))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Execution(_)), "got {err:?}");
    assert!(err.to_string().starts_with("failed to execute request to target server"));
}

#[tokio::test]
async fn redirect_to_metadata_address_is_refused() {
    let origin = start_redirect_origin("http://169.254.169.254/latest/meta-data".into()).await;
    let runner = runner(&test_config());

    let err = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Execution(_)), "got {err:?}");
}

#[tokio::test]
async fn redirect_to_name_resolving_to_loopback_is_refused() {
    let target = start_echo_origin().await;
    let origin = start_redirect_origin(format!("http://localhost:{}/", target.port())).await;
    let runner = runner(&test_config());

    let err = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::Execution(_)), "got {err:?}");
}

#[tokio::test]
async fn redirect_between_trusted_origins_is_followed() {
    let target = start_echo_origin().await;
    let origin = start_redirect_origin(url(target, "/landed")).await;
    let runner = runner(&test_config());

    let response = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers["x-echo-method"], vec!["GET"]);
}

#[tokio::test]
async fn private_target_is_rejected_without_trust() {
    let origin = start_echo_origin().await;
    let runner = runner(&request_runner::config::RunnerConfig::default());

    let err = runner
        .run(&CallContext::background(), RequestDescription::new("GET", url(origin, "/")))
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::InvalidInput(_)), "got {err:?}");
}
