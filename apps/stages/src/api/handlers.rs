//! # API Endpoint Handlers
//!
//! Each handler acquires one storage `Session`, performs a single storage
//! operation and drops the session before the response is rendered.

use super::{
    AppState,
    error::ApiError,
    extract::{StageIdPath, StagePayload},
    types::{DELETED_MESSAGE, HealthResponse, MessageResponse, ROOT_MESSAGE, StageView},
};
use axum::{Json, extract::State, http::StatusCode};

// =============================================================================
// ROOT & HEALTH
// =============================================================================

/// Service banner.
pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new(ROOT_MESSAGE))
}

/// Health check endpoint.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let stages = state.database.session().count()?;
    Ok(Json(HealthResponse::ok(stages)))
}

// =============================================================================
// STAGE HANDLERS
// =============================================================================

/// `POST /stages/` - create a Stage.
pub async fn create_stage_handler(
    State(state): State<AppState>,
    StagePayload(payload): StagePayload,
) -> Result<(StatusCode, Json<StageView>), ApiError> {
    let stage = {
        let session = state.database.session();
        session.create(&payload.into_new_stage())?
    };

    tracing::info!(stage_id = stage.id.0, "Stage created");
    Ok((StatusCode::CREATED, Json(StageView::from(stage))))
}

/// `GET /stages/` - list every Stage in id order.
pub async fn list_stages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageView>>, ApiError> {
    let stages = state.database.session().list_all()?;
    Ok(Json(stages.into_iter().map(StageView::from).collect()))
}

/// `GET /stages/{id}` - fetch one Stage.
pub async fn get_stage_handler(
    State(state): State<AppState>,
    StageIdPath(id): StageIdPath,
) -> Result<Json<StageView>, ApiError> {
    let stage = state
        .database
        .session()
        .get_by_id(id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(StageView::from(stage)))
}

/// `DELETE /stages/{id}` - remove one Stage.
pub async fn delete_stage_handler(
    State(state): State<AppState>,
    StageIdPath(id): StageIdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.database.session().delete(id)? {
        return Err(ApiError::NotFound);
    }

    tracing::info!(stage_id = id.0, "Stage deleted");
    Ok(Json(MessageResponse::new(DELETED_MESSAGE)))
}
