//! Error responses.
//!
//! Every failure leaves the API as `{"error": message}` with a status code
//! derived from the failure kind:
//!
//! | failure                      | status |
//! |------------------------------|--------|
//! | unreadable description       | 400    |
//! | description over size limit  | 413    |
//! | `RunnerError::InvalidInput`  | 400    |
//! | `RunnerError::Timeout`       | 504    |
//! | `RunnerError::Execution`     | 500    |

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::runner::RunnerError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed inbound call.
#[derive(Debug)]
pub enum ApiError {
    Description(JsonRejection),
    Runner(RunnerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Description(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Description(_) => StatusCode::BAD_REQUEST,
            Self::Runner(RunnerError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Runner(RunnerError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Runner(RunnerError::Execution(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Description(rejection) => {
                format!("invalid request description: {}", rejection.body_text())
            }
            Self::Runner(e) => e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Description(rejection)
    }
}

impl From<RunnerError> for ApiError {
    fn from(err: RunnerError) -> Self {
        Self::Runner(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}
