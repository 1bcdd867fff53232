//! # Session Module
//!
//! The `Database` handle and the per-request `Session` guard.
//!
//! A `Database` is opened once at process start (which also creates any
//! missing tables) and shared by every request. Each request acquires a
//! `Session` from it, runs its storage operation through that session, and
//! releases it by dropping it. Dropping happens on every exit path, including
//! early returns through `?`.
//!
//! ## Storage Backends
//!
//! - `InMemory`: uses `MemoryStages` (fast, volatile)
//! - `Persistent`: uses `RedbStages` for disk-backed ACID storage

use crate::store::{MemoryStages, StageStore};
use crate::storage::RedbStages;
use crate::{NewStage, Stage, StageId, StagesError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Storage backend for a Database.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory table (fast, volatile).
    InMemory(MemoryStages),
    /// Disk-backed table using redb (ACID, persistent).
    Persistent(RedbStages),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStages::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn StageStore {
        match self {
            Self::InMemory(memory) => memory,
            Self::Persistent(redb) => redb,
        }
    }
}

/// Shared handle to the Stage table.
///
/// Hands out one `Session` per unit of work and tracks how many are live.
#[derive(Debug, Default)]
pub struct Database {
    backend: StorageBackend,
    open_sessions: AtomicUsize,
}

impl Database {
    /// Create a database with volatile in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open or create a persistent redb database at the given path.
    ///
    /// This is the bootstrap step: every table is created if absent, and an
    /// existing file is opened without touching its contents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StagesError> {
        Ok(Self::with_backend(StorageBackend::Persistent(
            RedbStages::open(path)?,
        )))
    }

    /// Create a database over an existing backend.
    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self {
            backend,
            open_sessions: AtomicUsize::new(0),
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Acquire a session. It is released when dropped.
    #[must_use]
    pub fn session(&self) -> Session<'_> {
        self.open_sessions.fetch_add(1, Ordering::AcqRel);
        Session {
            store: self.backend.store(),
            open_sessions: &self.open_sessions,
        }
    }

    /// Number of sessions currently acquired and not yet dropped.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::Acquire)
    }
}

/// One unit of work against the Stage table.
///
/// Each operation commits before it returns; the session itself holds no
/// transaction open between calls.
pub struct Session<'db> {
    store: &'db dyn StageStore,
    open_sessions: &'db AtomicUsize,
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session<'_> {
    /// Insert a Stage. See [`StageStore::create`].
    pub fn create(&self, new: &NewStage) -> Result<Stage, StagesError> {
        self.store.create(new)
    }

    /// All Stages in ascending id order.
    pub fn list_all(&self) -> Result<Vec<Stage>, StagesError> {
        self.store.list_all()
    }

    /// The Stage with the given id, or `None`.
    pub fn get_by_id(&self, id: StageId) -> Result<Option<Stage>, StagesError> {
        self.store.get_by_id(id)
    }

    /// Remove a Stage; `false` when no Stage had that id.
    pub fn delete(&self, id: StageId) -> Result<bool, StagesError> {
        self.store.delete(id)
    }

    /// Number of stored Stages.
    pub fn count(&self) -> Result<usize, StagesError> {
        self.store.count()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.open_sessions.fetch_sub(1, Ordering::AcqRel);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn with_detalle(detalle: &str) -> NewStage {
        NewStage::new(None, Some(detalle.to_string()), None)
    }

    #[test]
    fn session_released_on_drop() {
        let db = Database::in_memory();
        {
            let session = db.session();
            assert_eq!(db.open_sessions(), 1);
            session.create(&with_detalle("A")).unwrap();
        }
        assert_eq!(db.open_sessions(), 0);
    }

    #[test]
    fn session_released_on_error_path() {
        fn create_twice(db: &Database) -> Result<Stage, StagesError> {
            let session = db.session();
            session.create(&with_detalle("A"))?;
            session.create(&with_detalle("A"))
        }

        let db = Database::in_memory();
        assert!(create_twice(&db).unwrap_err().is_constraint_violation());
        assert_eq!(db.open_sessions(), 0);
    }

    #[test]
    fn concurrent_colliding_creates_memory() {
        let db = Database::in_memory();
        assert_exactly_one_wins(&db);
    }

    #[test]
    fn concurrent_colliding_creates_redb() {
        let temp = tempdir().expect("temp dir");
        let db = Database::open(temp.path().join("race.redb")).expect("open db");
        assert!(db.is_persistent());
        assert_exactly_one_wins(&db);
    }

    fn assert_exactly_one_wins(db: &Database) {
        let results: Vec<Result<Stage, StagesError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    scope.spawn(move || {
                        let new = NewStage::new(
                            Some(format!("F-{i}")),
                            Some("Entrega A".to_string()),
                            Some(format!("http://x/{i}.pdf")),
                        );
                        db.session().create(&new)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_constraint_violation()))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);

        let session = db.session();
        assert_eq!(session.count().unwrap(), 1);
        drop(session);
        assert_eq!(db.open_sessions(), 0);
    }
}
