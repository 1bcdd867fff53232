//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, StageView};
use crate::config::{Backend, Config, StorageConfig};
use crate::error::AppError;
use stages_core::{Database, StageId};

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Bootstrap storage, then start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), AppError> {
    // Tables must exist before the listener accepts its first request.
    let database = open_database(&config.storage)?;

    println!("Stages Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.server.addr());
    println!("  Backend:  {}", config.storage.backend);
    println!("  Database: {:?}", config.storage.path);
    println!();
    println!("Endpoints:");
    println!("  POST   /stages/     - Create a stage");
    println!("  GET    /stages/     - List stages");
    println!("  GET    /stages/{{id}} - Get a stage");
    println!("  DELETE /stages/{{id}} - Delete a stage");
    println!("  GET    /health      - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.server.addr(), database, &config.http).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the database file and its tables if absent.
pub fn cmd_init(storage: &StorageConfig) -> Result<(), AppError> {
    match storage.backend {
        Backend::Redb => {
            let database = open_database(storage)?;
            let count = database.session().count()?;
            println!(
                "Database ready at {:?} ({} stages)",
                storage.path, count
            );
        }
        Backend::Memory => {
            println!("Memory backend selected; nothing to initialize");
        }
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show storage location and Stage count.
pub fn cmd_status(storage: &StorageConfig, json_mode: bool) -> Result<(), AppError> {
    let database = open_database(storage)?;
    let count = database.session().count()?;

    if json_mode {
        let output = serde_json::json!({
            "database": storage.path.to_string_lossy(),
            "backend": storage.backend.to_string(),
            "stages": count,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Stages Status");
    println!("=============");
    println!("Database: {:?}", storage.path);
    println!("Backend:  {}", storage.backend);
    println!("Stages:   {}", count);

    Ok(())
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// Print every Stage.
pub fn cmd_list(storage: &StorageConfig, json_mode: bool) -> Result<(), AppError> {
    let database = open_database(storage)?;
    let stages: Vec<StageView> = database
        .session()
        .list_all()?
        .into_iter()
        .map(StageView::from)
        .collect();

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&stages).unwrap_or_default()
        );
        return Ok(());
    }

    if stages.is_empty() {
        println!("No stages");
        return Ok(());
    }

    println!("{:>6}  {:<16}  {:<32}  FILE_URL", "ID", "N_FACTURA", "DETALLE");
    for stage in &stages {
        println!(
            "{:>6}  {:<16}  {:<32}  {}",
            stage.id,
            stage.n_factura.as_deref().unwrap_or("-"),
            stage.detalle.as_deref().unwrap_or("-"),
            stage.file_url.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Print one Stage; fails if the id is unknown.
pub fn cmd_show(storage: &StorageConfig, json_mode: bool, id: i64) -> Result<(), AppError> {
    let id = StageId(id);
    let database = open_database(storage)?;
    let stage = database
        .session()
        .get_by_id(id)?
        .map(StageView::from)
        .ok_or(AppError::NotFound(id))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&stage).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Stage {}", stage.id);
    println!("  n_factura: {}", stage.n_factura.as_deref().unwrap_or("-"));
    println!("  detalle:   {}", stage.detalle.as_deref().unwrap_or("-"));
    println!("  file_url:  {}", stage.file_url.as_deref().unwrap_or("-"));
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the configured backend, creating redb tables if absent.
pub fn open_database(storage: &StorageConfig) -> Result<Database, AppError> {
    match storage.backend {
        Backend::Redb => {
            let database = Database::open(&storage.path)?;
            tracing::info!("Opened redb database at {}", storage.path.display());
            Ok(database)
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory storage; stages are lost on exit");
            Ok(Database::in_memory())
        }
    }
}
