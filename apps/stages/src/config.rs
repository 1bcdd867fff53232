//! # Configuration
//!
//! Layered configuration for the Stages binary. Later layers win:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config <file>` or `STAGES_CONFIG`)
//! 3. Environment (`STAGES_CORS_ORIGINS`, `STAGES_RATE_LIMIT`)
//! 4. Command-line flags (applied by the CLI)
//!
//! ## File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [storage]
//! backend = "redb"
//! path = "stages.redb"
//!
//! [http]
//! cors_origins = ["http://localhost:3000"]
//! rate_limit = 100
//! body_limit = 1048576
//! ```

use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "STAGES_CONFIG";

/// Comma-separated list of allowed CORS origins, or `*`.
pub const CORS_ORIGINS_ENV: &str = "STAGES_CORS_ORIGINS";

/// Requests per second; 0 disables rate limiting.
pub const RATE_LIMIT_ENV: &str = "STAGES_RATE_LIMIT";

// =============================================================================
// SECTIONS
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
}

/// Listener address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Disk-backed redb database.
    #[default]
    Redb,
    /// Volatile in-memory table, lost on exit.
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Storage location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: Backend,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Redb,
            path: PathBuf::from("stages.redb"),
        }
    }
}

/// HTTP middleware settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Allowed origins. Empty means localhost only; `["*"]` allows all.
    pub cors_origins: Vec<String>,
    /// Global requests per second; 0 disables the limiter.
    pub rate_limit: u32,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            rate_limit: 100,
            body_limit: 1024 * 1024,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Load defaults, then the file (explicit path or `STAGES_CONFIG`),
    /// then the environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origins) = lookup(CORS_ORIGINS_ENV) {
            self.http.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(limit) = lookup(RATE_LIMIT_ENV) {
            match limit.trim().parse() {
                Ok(rps) => self.http.rate_limit = rps,
                Err(e) => tracing::warn!(
                    "Ignoring {}='{}': {}",
                    RATE_LIMIT_ENV,
                    limit,
                    e
                ),
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
