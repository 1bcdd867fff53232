//! # Stages HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner
//! - `GET /health` - Health check with Stage count
//! - `POST /stages/` - Create a Stage
//! - `GET /stages/` - List all Stages
//! - `GET /stages/{id}` - Fetch one Stage
//! - `DELETE /stages/{id}` - Delete one Stage
//!
//! `/stages` and `/stages/` are both routed to the collection handlers.

mod error;
mod extract;
mod handlers;
mod middleware;
mod types;

pub use error::ApiError;
pub use handlers::{
    create_stage_handler, delete_stage_handler, get_stage_handler, health_handler,
    list_stages_handler, root_handler,
};
pub use middleware::{build_cors_layer, create_rate_limiter};
pub use types::{
    DELETED_MESSAGE, ErrorResponse, HealthResponse, MessageResponse, NOT_FOUND_DETAIL,
    ROOT_MESSAGE, StageCreate, StageView,
};

use crate::config::HttpConfig;
use crate::error::AppError;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
};
use stages_core::Database;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the Stage database.
#[derive(Clone)]
pub struct AppState {
    /// Session factory shared by every request.
    pub database: Arc<Database>,
}

impl AppState {
    /// Create new app state over an opened database.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - if enabled
pub fn create_router(state: AppState, http: &HttpConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route(
            "/stages",
            get(handlers::list_stages_handler).post(handlers::create_stage_handler),
        )
        .route(
            "/stages/",
            get(handlers::list_stages_handler).post(handlers::create_stage_handler),
        )
        .route(
            "/stages/{id}",
            get(handlers::get_stage_handler).delete(handlers::delete_stage_handler),
        );

    match create_rate_limiter(http.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", http.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(DefaultBodyLimit::max(http.body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(http)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl+C or SIGTERM.
pub async fn run_server(addr: &str, database: Database, http: &HttpConfig) -> Result<(), AppError> {
    let router = create_router(AppState::new(database), http);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stages HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
