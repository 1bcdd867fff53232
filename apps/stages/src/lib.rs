//! # Stages - record service
//!
//! Library half of the `stages` binary: the HTTP API, CLI commands and
//! configuration. Exposed as a library so integration tests can build the
//! router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
