//! Server-side request forgery defenses.
//!
//! # Responsibilities
//! - Classify addresses a caller must never reach (loopback, link-local,
//!   RFC1918, unspecified, IPv6 unique-local)
//! - Check host names at validation time and again at connect time
//! - Refuse redirects that leave http(s) or land on a blocked IP literal
//!
//! # Design Decisions
//! - One [`AddressPolicy`] instance is shared by the validator and the
//!   transport, so both checks always agree
//! - The transport resolves through [`GuardedResolver`]; a DNS answer that
//!   changes between validation and connect is caught when the socket opens

use std::collections::HashSet;
use std::error::Error as StdError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect;
use thiserror::Error;
use url::{Host, Url};

use crate::config::SecurityConfig;
use crate::net::HostResolver;

/// A connection target refused by the address policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("requests to private IP addresses are not allowed ({host} resolves to {ip})")]
pub struct BlockedAddress {
    pub host: String,
    pub ip: IpAddr,
}

/// Decides which resolved addresses a caller-chosen URL may connect to.
#[derive(Debug, Clone, Default)]
pub struct AddressPolicy {
    trusted_hosts: HashSet<String>,
}

impl AddressPolicy {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            trusted_hosts: config
                .trusted_hosts
                .iter()
                .map(|h| normalize_host(h))
                .collect(),
        }
    }

    /// Whether `host` is exempt from the address check.
    pub fn is_trusted(&self, host: &str) -> bool {
        !self.trusted_hosts.is_empty() && self.trusted_hosts.contains(&normalize_host(host))
    }

    /// Whether `ip` falls in a range callers must not reach.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => is_blocked_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => is_blocked_v4(v4),
                None => is_blocked_v6(v6),
            },
        }
    }

    /// Check every address of `host`; one blocked address rejects the host.
    pub fn check_addresses(&self, host: &str, ips: &[IpAddr]) -> Result<(), BlockedAddress> {
        if self.is_trusted(host) {
            return Ok(());
        }
        match ips.iter().find(|ip| self.is_blocked(**ip)) {
            Some(ip) => Err(BlockedAddress {
                host: host.to_string(),
                ip: *ip,
            }),
            None => Ok(()),
        }
    }

    /// Check a URL host that is an IP literal. Domains return `Ok` and are
    /// left to resolution.
    pub fn check_literal(&self, host: &Host<&str>) -> Result<(), BlockedAddress> {
        let ip = match host {
            Host::Ipv4(v4) => IpAddr::V4(*v4),
            Host::Ipv6(v6) => IpAddr::V6(*v6),
            Host::Domain(_) => return Ok(()),
        };
        self.check_addresses(&host.to_string(), &[ip])
    }
}

fn normalize_host(host: &str) -> String {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        // 224.0.0.0/24 link-local multicast
        || (a == 224 && b == 0 && c == 0)
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fe80::/10 link-local unicast
        || (first & 0xffc0) == 0xfe80
        // ff02::/16 link-local multicast
        || (first & 0xff0f) == 0xff02
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
}

/// DNS resolver for the outbound transport that refuses blocked addresses.
pub struct GuardedResolver {
    resolver: Arc<dyn HostResolver>,
    policy: Arc<AddressPolicy>,
}

impl GuardedResolver {
    pub fn new(resolver: Arc<dyn HostResolver>, policy: Arc<AddressPolicy>) -> Self {
        Self { resolver, policy }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.resolver);
        let policy = Arc::clone(&self.policy);
        let host = name.as_str().to_string();

        Box::pin(async move {
            let ips = resolver.lookup(&host).await?;
            if let Err(blocked) = policy.check_addresses(&host, &ips) {
                tracing::warn!(host = %host, ip = %blocked.ip, "Blocked connect-time resolution");
                return Err(Box::new(blocked) as Box<dyn StdError + Send + Sync>);
            }
            let addrs: Addrs = Box::new(ips.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<Addrs, Box<dyn StdError + Send + Sync>>(addrs)
        })
    }
}

/// Redirect policy: bounded hops, http(s) only, no blocked IP literals.
pub fn redirect_policy(policy: Arc<AddressPolicy>, max_redirects: usize) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(format!("stopped after {max_redirects} redirects"));
        }
        match check_redirect_target(&policy, attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(reason) => attempt.error(reason),
        }
    })
}

fn check_redirect_target(policy: &AddressPolicy, url: &Url) -> Result<(), String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("redirect to disallowed scheme: {}", url.scheme()));
    }
    let host = url
        .host()
        .ok_or_else(|| "redirect target has no host".to_string())?;
    policy.check_literal(&host).map_err(|e| e.to_string())
}
