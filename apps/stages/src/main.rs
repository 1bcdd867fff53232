//! # Stages - record service
//!
//! The main binary for the Stages service.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for inspecting the Stage table
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            apps/stages (THE BINARY)          │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │  stages-core  │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! stages server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! stages init
//! stages status
//! stages list --json-mode
//! stages show 1
//! ```

use clap::Parser;
use stages::cli;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `json` switches log lines to JSON; anything else keeps the text format.
const LOG_FORMAT_ENV: &str = "STAGES_LOG_FORMAT";

const DEFAULT_LOG_FILTER: &str = "stages=info,tower_http=debug";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = cli::Cli::parse();
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    match cli::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the global subscriber. Logs go to stderr so `--json-mode`
/// output on stdout stays machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let (text_layer, json_layer) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();
}

fn print_banner() {
    eprintln!(
        r#"
  ┏━┓╺┳╸┏━┓┏━╸┏━╸┏━┓
  ┗━┓ ┃ ┣━┫┃╺┓┣╸ ┗━┓
  ┗━┛ ╹ ╹ ╹┗━┛┗━╸┗━┛

  Stages Service v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
