//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Wire shapes are separate from the storage shapes in `stages-core`:
//! `StageCreate` never carries an `id`, `StageView` always does.

use serde::{Deserialize, Serialize};
use stages_core::{NewStage, Stage};

/// Body of `GET /`.
pub const ROOT_MESSAGE: &str = "API de stages funcionando 🚀";

/// Detail of every not-found response.
pub const NOT_FOUND_DETAIL: &str = "Stage no encontrado";

/// Body message of a successful delete.
pub const DELETED_MESSAGE: &str = "Stage eliminado correctamente";

// =============================================================================
// STAGE SCHEMAS
// =============================================================================

/// Create request body. Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCreate {
    #[serde(default)]
    pub n_factura: Option<String>,
    #[serde(default)]
    pub detalle: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl StageCreate {
    /// Convert to the storage insert shape.
    pub fn into_new_stage(self) -> NewStage {
        NewStage::new(self.n_factura, self.detalle, self.file_url)
    }
}

/// A Stage as returned to clients. Absent fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageView {
    pub id: i64,
    pub n_factura: Option<String>,
    pub detalle: Option<String>,
    pub file_url: Option<String>,
}

impl From<Stage> for StageView {
    fn from(stage: Stage) -> Self {
        Self {
            id: stage.id.0,
            n_factura: stage.n_factura,
            detalle: stage.detalle,
            file_url: stage.file_url,
        }
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// `{"message": ...}` body used by the root endpoint and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"detail": ...}` body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub stages: usize,
}

impl HealthResponse {
    pub fn ok(stages: usize) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            stages,
        }
    }
}
