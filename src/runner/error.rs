//! Failure kinds of a single run.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Errors that end a run without a response.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The request description failed validation. Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The outbound call did not finish before its deadline.
    #[error("request timeout: no complete response within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Any other failure performing the outbound call.
    #[error("failed to execute request to target server: {0}")]
    Execution(String),
}

impl RunnerError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Wrap a transport error, keeping its whole cause chain.
    pub(crate) fn execution(err: &(dyn StdError + 'static)) -> Self {
        Self::Execution(error_chain(err))
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout(_) => "timeout",
            Self::Execution(_) => "execution_error",
        }
    }
}

/// Render an error followed by each distinct cause.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
