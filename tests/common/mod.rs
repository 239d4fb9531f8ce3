//! Shared utilities for integration tests: mock target servers on ephemeral
//! loopback ports and a config that trusts them.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use request_runner::config::RunnerConfig;
use request_runner::net::SystemResolver;
use request_runner::runner::RequestRunner;

/// Default config with the loopback origins exempt from the SSRF check.
pub fn test_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.security.trusted_hosts = vec!["127.0.0.1".to_string()];
    config
}

pub fn runner(config: &RunnerConfig) -> RequestRunner {
    RequestRunner::from_config(config, Arc::new(SystemResolver)).unwrap()
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Origin that echoes the body, reports the method in `x-echo-method` and
/// every request header `h` as `x-echo-h`.
pub async fn start_echo_origin() -> SocketAddr {
    serve(Router::new().fallback(echo)).await
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Response {
    let mut echoed = HeaderMap::new();
    echoed.insert("x-echo-method", HeaderValue::from_str(method.as_str()).unwrap());
    for (name, value) in &headers {
        let name = HeaderName::from_bytes(format!("x-echo-{}", name).as_bytes()).unwrap();
        echoed.append(name, value.clone());
    }
    (StatusCode::OK, echoed, body).into_response()
}

/// Origin that answers after `delay`.
pub async fn start_slow_origin(delay: Duration) -> SocketAddr {
    let router = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "done"
    });
    serve(router).await
}

/// Origin whose body is `size` bytes of `a`.
pub async fn start_sized_origin(size: usize) -> SocketAddr {
    let router = Router::new().fallback(move || async move { vec![b'a'; size] });
    serve(router).await
}

/// Origin that redirects every call to `location`.
pub async fn start_redirect_origin(location: String) -> SocketAddr {
    let router = Router::new().fallback(move || {
        let location = location.clone();
        async move { (StatusCode::FOUND, [(header::LOCATION, location)], Body::empty()) }
    });
    serve(router).await
}

/// Origin that promises 100 body bytes, sends a few, then hangs up.
pub async fn start_broken_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\npartial";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Origin that sends its status line, headers and part of the body, then
/// stalls with the connection open.
pub async fn start_stalling_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nX-Seen: yes\r\n\r\npartial";
                let _ = socket.write_all(response.as_bytes()).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });
    addr
}

/// A loopback address with nothing listening.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
