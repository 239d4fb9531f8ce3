//! Host name resolution.
//!
//! The validator and the outbound transport both resolve through a
//! [`HostResolver`], so one resolver instance decides what a host name means
//! for the whole process.

use std::io;
use std::net::IpAddr;

use futures_util::future::BoxFuture;

/// Resolves a host name to the set of addresses a connection could use.
pub trait HostResolver: Send + Sync + 'static {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>>;
}

/// Resolver backed by the operating system (`getaddrinfo` via Tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn lookup<'a>(&'a self, host: &'a str) -> BoxFuture<'a, io::Result<Vec<IpAddr>>> {
        Box::pin(async move {
            let mut ips: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
                .await?
                .map(|addr| addr.ip())
                .collect();
            ips.sort();
            ips.dedup();
            if ips.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses found for {host}"),
                ));
            }
            Ok(ips)
        })
    }
}
