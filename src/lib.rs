//! Request runner library: validates caller-described HTTP requests against
//! an SSRF policy and executes them on a shared pooled transport.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod runner;
pub mod security;

pub use config::RunnerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use runner::{
    CallContext, NormalizedResponse, RequestDescription, RequestRunner, RunnerError,
};
