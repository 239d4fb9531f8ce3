//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Caller request description:
//!     → ssrf.rs (target address policy, checked at validation and connect)
//!     → headers.rs (strip deny-listed headers)
//!     → Vetted request handed to the executor
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in caller input

pub mod headers;
pub mod ssrf;

pub use ssrf::{AddressPolicy, BlockedAddress, GuardedResolver};
