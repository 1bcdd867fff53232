//! # Extractors
//!
//! Request extractors that reject with `ApiError`, so malformed
//! bodies and ids get the same `{"detail": ...}` shape as every other error.

use super::error::ApiError;
use super::types::StageCreate;
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::request::Parts;
use stages_core::StageId;

/// Validated create body.
pub struct StagePayload(pub StageCreate);

impl<S> FromRequest<S> for StagePayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<StageCreate>::from_request(req, state)
            .await
            .map_err(reject_body)?;
        Ok(Self(payload))
    }
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(rejection.body_text())
    } else {
        ApiError::Validation(rejection.body_text())
    }
}

/// Integer `{id}` path segment.
pub struct StageIdPath(pub StageId);

impl<S> FromRequestParts<S> for StageIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<i64> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(StageId(id)))
    }
}
