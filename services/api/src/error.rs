//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service, and the JSON error
//! body handlers send back when a request fails.

use crate::config::ConfigError;
use assessment_core::{PassageFailure, PassageUnavailableError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Request Errors
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    code: String,
    message: String,
}

/// A failed request: status, machine-readable code and a message for the UI.
#[derive(Debug)]
pub struct RequestError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl RequestError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PassageUnavailableError> for RequestError {
    fn from(err: PassageUnavailableError) -> Self {
        match err.cause {
            PassageFailure::Resolution(_) => {
                warn!("Language could not be resolved: {}", err);
                Self {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    code: "LANGUAGE_UNRESOLVED",
                    message: format!("Could not determine a language code for '{}'", err.language),
                }
            }
            PassageFailure::Generation(_) => {
                error!("Passage generation failed: {}", err);
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    code: "PASSAGE_UNAVAILABLE",
                    message: format!("Unable to provide passage for {}", err.language),
                }
            }
        }
    }
}

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self {
            status: rejection.status(),
            code: "INVALID_BODY",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
