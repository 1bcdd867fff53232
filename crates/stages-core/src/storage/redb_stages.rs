//! # redb-backed Stage Storage
//!
//! A disk-backed Stage table using the redb embedded database, providing:
//! - ACID transactions (each operation is one transaction)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! ## Layout
//!
//! Relational columns map onto redb tables as follows:
//! - `stages`: id -> postcard-encoded `Stage`
//! - `stages_detalle_idx`: detalle -> id (unique index)
//! - `stages_file_url_idx`: file_url -> id (unique index)
//! - `stages_meta`: `next_id` -> next id to hand out
//!
//! The unique indexes are read and written inside the same write transaction
//! as the row, and redb admits one writer at a time, so two colliding creates
//! can never both commit.

use crate::store::StageStore;
use crate::{NewStage, Stage, StageId, StagesError, UniqueField};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};
use std::path::Path;

/// Table for rows: StageId(i64) -> serialized Stage bytes
const STAGES: TableDefinition<i64, &[u8]> = TableDefinition::new("stages");

/// Unique index on `detalle`: value -> StageId(i64)
const DETALLE_INDEX: TableDefinition<&str, i64> = TableDefinition::new("stages_detalle_idx");

/// Unique index on `file_url`: value -> StageId(i64)
const FILE_URL_INDEX: TableDefinition<&str, i64> = TableDefinition::new("stages_file_url_idx");

/// Table for metadata: key string -> value i64
const METADATA: TableDefinition<&str, i64> = TableDefinition::new("stages_meta");

const NEXT_ID_KEY: &str = "next_id";

fn io_error(e: impl std::fmt::Display) -> StagesError {
    StagesError::IoError(e.to_string())
}

fn encode(stage: &Stage) -> Result<Vec<u8>, StagesError> {
    postcard::to_allocvec(stage).map_err(|e| StagesError::SerializationError(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Stage, StagesError> {
    postcard::from_bytes(bytes).map_err(|e| StagesError::SerializationError(e.to_string()))
}

/// A disk-backed Stage store using redb.
pub struct RedbStages {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStages").finish_non_exhaustive()
    }
}

impl RedbStages {
    /// Open or create a Stage database at the given path.
    ///
    /// Creates every table that does not exist yet. Safe to call against an
    /// existing database: rows and the id counter are left untouched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StagesError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;
        let stages = Self { db };
        stages.ensure_tables()?;
        Ok(stages)
    }

    /// Create any missing table. Idempotent.
    pub fn ensure_tables(&self) -> Result<(), StagesError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            write_txn.open_table(STAGES).map_err(io_error)?;
            write_txn.open_table(DETALLE_INDEX).map_err(io_error)?;
            write_txn.open_table(FILE_URL_INDEX).map_err(io_error)?;
            write_txn.open_table(METADATA).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)
    }
}

/// Index tables opened inside one write transaction.
struct UniqueIndexes<'txn> {
    detalle: Table<'txn, &'static str, i64>,
    file_url: Table<'txn, &'static str, i64>,
}

impl<'txn> UniqueIndexes<'txn> {
    fn for_field(&mut self, field: UniqueField) -> &mut Table<'txn, &'static str, i64> {
        match field {
            UniqueField::Detalle => &mut self.detalle,
            UniqueField::FileUrl => &mut self.file_url,
        }
    }
}

// =============================================================================
// STAGESTORE TRAIT IMPLEMENTATION
// =============================================================================

impl StageStore for RedbStages {
    fn create(&self, new: &NewStage) -> Result<Stage, StagesError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;

        let stage = {
            let mut rows = write_txn.open_table(STAGES).map_err(io_error)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io_error)?;
            let mut indexes = UniqueIndexes {
                detalle: write_txn.open_table(DETALLE_INDEX).map_err(io_error)?,
                file_url: write_txn.open_table(FILE_URL_INDEX).map_err(io_error)?,
            };

            // Dropping the transaction without commit discards everything.
            for (field, value) in new.unique_values() {
                if indexes.for_field(field).get(value).map_err(io_error)?.is_some() {
                    return Err(StagesError::ConstraintViolation {
                        field,
                        value: value.to_string(),
                    });
                }
            }

            let id = meta
                .get(NEXT_ID_KEY)
                .map_err(io_error)?
                .map(|v| StageId(v.value()))
                .unwrap_or(StageId::FIRST);
            let following = id.next()?;

            let stage = new.clone().into_stage(id);
            let bytes = encode(&stage)?;

            rows.insert(id.0, bytes.as_slice()).map_err(io_error)?;
            for (field, value) in new.unique_values() {
                indexes.for_field(field).insert(value, id.0).map_err(io_error)?;
            }
            meta.insert(NEXT_ID_KEY, following.0).map_err(io_error)?;

            stage
        };

        write_txn.commit().map_err(io_error)?;
        Ok(stage)
    }

    fn list_all(&self) -> Result<Vec<Stage>, StagesError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let rows = read_txn.open_table(STAGES).map_err(io_error)?;

        let mut stages = Vec::new();
        for entry in rows.iter().map_err(io_error)? {
            let (_, value) = entry.map_err(io_error)?;
            stages.push(decode(value.value())?);
        }
        Ok(stages)
    }

    fn get_by_id(&self, id: StageId) -> Result<Option<Stage>, StagesError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let rows = read_txn.open_table(STAGES).map_err(io_error)?;

        match rows.get(id.0).map_err(io_error)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn delete(&self, id: StageId) -> Result<bool, StagesError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;

        let removed = {
            let mut rows = write_txn.open_table(STAGES).map_err(io_error)?;
            let mut indexes = UniqueIndexes {
                detalle: write_txn.open_table(DETALLE_INDEX).map_err(io_error)?,
                file_url: write_txn.open_table(FILE_URL_INDEX).map_err(io_error)?,
            };

            let removed = match rows.remove(id.0).map_err(io_error)? {
                Some(data) => Some(decode(data.value())?),
                None => None,
            };

            if let Some(stage) = &removed {
                for field in [UniqueField::Detalle, UniqueField::FileUrl] {
                    if let Some(value) = stage.unique_value(field) {
                        indexes.for_field(field).remove(value).map_err(io_error)?;
                    }
                }
            }
            removed.is_some()
        };

        write_txn.commit().map_err(io_error)?;
        Ok(removed)
    }

    fn count(&self) -> Result<usize, StagesError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let rows = read_txn.open_table(STAGES).map_err(io_error)?;
        Ok(rows.len().map_err(io_error)? as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
