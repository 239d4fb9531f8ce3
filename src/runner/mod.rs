//! Request execution core.
//!
//! # Data Flow
//! ```text
//! RequestDescription (untrusted JSON)
//!     → validator.rs (method, URL, scheme, SSRF, timeout, headers)
//!     → VettedRequest (only constructible by the validator)
//!     → executor.rs (pooled client, deadline, capped body read)
//!     → NormalizedResponse | RunnerError
//! ```
//!
//! # States (per call)
//! ```text
//! Validating → Executing → Succeeded
//!                        → Succeeded with degradation (truncated / unreadable body)
//!                        → Failed(timeout)
//!                        → Failed(execution error)
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod policy;
pub mod types;
pub mod validator;

use std::sync::Arc;

pub use context::CallContext;
pub use error::RunnerError;
pub use executor::RequestExecutor;
pub use policy::RequestPolicy;
pub use types::{Degradation, NormalizedResponse, RequestDescription};
pub use validator::{RequestValidator, VettedRequest};

use crate::config::RunnerConfig;
use crate::net::HostResolver;
use crate::security::AddressPolicy;

/// Validate-then-execute service shared by all inbound calls.
#[derive(Clone)]
pub struct RequestRunner {
    validator: RequestValidator,
    executor: RequestExecutor,
}

impl RequestRunner {
    /// Compile policies and build the shared transport from `config`.
    pub fn from_config(
        config: &RunnerConfig,
        resolver: Arc<dyn HostResolver>,
    ) -> Result<Self, reqwest::Error> {
        let policy = Arc::new(RequestPolicy::from_config(&config.runner));
        let addresses = Arc::new(AddressPolicy::new(&config.security));

        let executor = RequestExecutor::new(
            &config.transport,
            policy.max_response_bytes,
            Arc::clone(&addresses),
            Arc::clone(&resolver),
        )?;
        let validator = RequestValidator::new(policy, addresses, resolver);

        Ok(Self {
            validator,
            executor,
        })
    }

    pub fn validator(&self) -> &RequestValidator {
        &self.validator
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Validate `description`, then execute it. Execution never starts unless
    /// validation succeeded.
    pub async fn run(
        &self,
        ctx: &CallContext,
        description: RequestDescription,
    ) -> Result<NormalizedResponse, RunnerError> {
        let vetted = self.validator.validate(ctx, description).await?;
        tracing::debug!(
            method = %vetted.method(),
            host = vetted.target().host_str().unwrap_or_default(),
            timeout_ms = vetted.timeout().as_millis() as u64,
            "Request vetted"
        );
        self.executor.execute(ctx, vetted).await
    }
}
