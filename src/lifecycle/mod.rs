//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight calls drain
//!             → forced exit after the grace period
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
