//! # stages-core
//!
//! The storage engine for the Stages service - THE LOGIC.
//!
//! A Stage is an invoice-linked record with an optional description and file
//! reference. This crate owns everything about how Stages are identified,
//! validated against uniqueness, and persisted:
//!
//! - `types` - the record model and the error type
//! - `store` - the `StageStore` trait and the in-memory backend
//! - `storage` - the redb-backed persistent backend
//! - `session` - the `Database` handle and per-request `Session` guards
//!
//! ## Architectural Constraints
//!
//! - Has NO async, NO network dependencies (pure Rust)
//! - Ids are assigned here and nowhere else; they ascend and are never reused
//! - `detalle` and `file_url` uniqueness is checked inside the same write
//!   transaction as the insert, so concurrent writers cannot both succeed

// =============================================================================
// MODULES
// =============================================================================

pub mod session;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use session::{Database, Session, StorageBackend};
pub use storage::RedbStages;
pub use store::{MemoryStages, StageStore};
pub use types::{NewStage, Stage, StageId, StagesError, UniqueField};
