//! # API Errors
//!
//! Every failure on the request path becomes an `ApiError`, which renders as
//! a `{"detail": ...}` JSON body with the matching status code.

use super::types::{ErrorResponse, NOT_FOUND_DETAIL};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stages_core::{StagesError, UniqueField};

/// API error type with automatic HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    /// No Stage has the requested id (404).
    NotFound,

    /// Body or path failed validation before storage was touched (422).
    Validation(String),

    /// Body exceeded the configured limit (413).
    PayloadTooLarge(String),

    /// Global request rate exceeded (429).
    RateLimited,

    /// A unique column already holds the submitted value (409).
    Conflict { field: UniqueField, value: String },

    /// Storage failed (500, logged).
    Storage(StagesError),
}

impl ApiError {
    /// Status code this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::NotFound => NOT_FOUND_DETAIL.to_string(),
            Self::Validation(reason) | Self::PayloadTooLarge(reason) => {
                tracing::debug!("Rejected request: {}", reason);
                reason
            }
            Self::RateLimited => {
                tracing::warn!("Rate limit exceeded");
                "Too Many Requests".to_string()
            }
            Self::Conflict { field, value } => {
                tracing::warn!(
                    event = "constraint_violation",
                    field = field.column(),
                    value = %value,
                    "Duplicate stage rejected"
                );
                format!("Ya existe un stage con ese {}", field)
            }
            Self::Storage(e) => {
                // Log the actual error, return generic message
                tracing::error!("Storage error: {}", e);
                "Error interno del servidor".to_string()
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<StagesError> for ApiError {
    fn from(e: StagesError) -> Self {
        match e {
            StagesError::ConstraintViolation { field, value } => Self::Conflict { field, value },
            other => Self::Storage(other),
        }
    }
}
