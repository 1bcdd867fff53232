//! # Stages CLI Module
//!
//! This module implements the CLI interface for the Stages service.
//!
//! ## Available Commands
//!
//! - `server` - Bootstrap storage and start the HTTP server (default)
//! - `init` - Create the database and its tables, then exit
//! - `status` - Show storage location and Stage count
//! - `list` - Print every Stage
//! - `show` - Print one Stage by id

mod commands;

use crate::config::Backend;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stages - invoice-linked record service
#[derive(Parser, Debug)]
#[command(name = "stages")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the Stage database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the database and its tables if absent
    Init,

    /// Show storage status
    Status,

    /// List every Stage
    List,

    /// Show one Stage
    Show {
        /// Stage id
        id: i64,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let mut config = crate::config::Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.storage.path = path;
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init) => cmd_init(&config.storage),
        Some(Commands::Status) => cmd_status(&config.storage, json_mode),
        Some(Commands::List) => cmd_list(&config.storage, json_mode),
        Some(Commands::Show { id }) => cmd_show(&config.storage, json_mode, id),
        // No subcommand - serve with the configured address
        None => cmd_server(&config).await,
    }
}
