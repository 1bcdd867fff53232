//! # Persistent Storage
//!
//! Disk-backed Stage storage built on the redb embedded database.

mod redb_stages;

pub use redb_stages::RedbStages;
