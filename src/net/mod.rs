//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Host name from a vetted URL
//!     → resolver.rs (HostResolver: system DNS or injected table)
//!     → security::ssrf (address policy check)
//!     → outbound connection pool
//! ```

pub mod resolver;

pub use resolver::{HostResolver, SystemResolver};
