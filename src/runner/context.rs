//! Caller-side deadline for a run.
//!
//! Cancellation is dropping the run future: every await point in validation
//! and execution gives it up together with any pooled connection it holds.
//! The deadline half lives here so it can be combined with the per-call
//! timeout of a vetted request.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline inherited from whoever started the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// No caller deadline; only the per-call timeout applies.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The earlier of the caller deadline and `start + timeout`.
    pub fn bounded(&self, start: Instant, timeout: Duration) -> Instant {
        let own = start + timeout;
        match self.deadline {
            Some(caller) => caller.min(own),
            None => own,
        }
    }
}
