//! # Application Errors
//!
//! Errors raised outside the HTTP request path: configuration loading,
//! storage bootstrap, server startup and CLI commands.

use stages_core::{StageId, StagesError};
use thiserror::Error;

/// Errors surfaced by the binary's commands.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The storage layer failed.
    #[error(transparent)]
    Storage(#[from] StagesError),

    /// Socket or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command referenced a Stage that does not exist.
    #[error("Stage no encontrado: {0}")]
    NotFound(StageId),
}
