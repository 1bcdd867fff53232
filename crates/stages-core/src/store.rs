//! # Stage Store
//!
//! The `StageStore` trait and the in-memory backend.
//!
//! Both backends give the same guarantees:
//! - ids ascend from 1 and are never reused
//! - a create that collides on `detalle` or `file_url` writes nothing
//! - `list_all` returns records in ascending id order

use crate::{NewStage, Stage, StageId, StagesError, UniqueField};
use std::collections::BTreeMap;
use std::sync::Mutex;

// =============================================================================
// STAGESTORE TRAIT
// =============================================================================

/// Storage operations over the single Stage table.
///
/// Every mutating call is its own unit of work: it is either fully applied
/// and durable when the call returns, or not applied at all.
pub trait StageStore: Send + Sync {
    /// Insert a Stage and return it with its assigned id.
    ///
    /// Fails with `StagesError::ConstraintViolation` if a non-null `detalle`
    /// or `file_url` already belongs to another Stage.
    fn create(&self, new: &NewStage) -> Result<Stage, StagesError>;

    /// All stored Stages in ascending id order.
    fn list_all(&self) -> Result<Vec<Stage>, StagesError>;

    /// The Stage with the given id, or `None`.
    fn get_by_id(&self, id: StageId) -> Result<Option<Stage>, StagesError>;

    /// Remove the Stage with the given id. Returns whether one was removed.
    fn delete(&self, id: StageId) -> Result<bool, StagesError>;

    /// Number of stored Stages.
    fn count(&self) -> Result<usize, StagesError>;
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

/// Table contents guarded by the `MemoryStages` mutex.
#[derive(Debug, Clone)]
struct MemoryTable {
    rows: BTreeMap<StageId, Stage>,
    detalle_index: BTreeMap<String, StageId>,
    file_url_index: BTreeMap<String, StageId>,
    next_id: StageId,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            detalle_index: BTreeMap::new(),
            file_url_index: BTreeMap::new(),
            next_id: StageId::FIRST,
        }
    }
}

impl MemoryTable {
    fn index(&self, field: UniqueField) -> &BTreeMap<String, StageId> {
        match field {
            UniqueField::Detalle => &self.detalle_index,
            UniqueField::FileUrl => &self.file_url_index,
        }
    }

    fn index_mut(&mut self, field: UniqueField) -> &mut BTreeMap<String, StageId> {
        match field {
            UniqueField::Detalle => &mut self.detalle_index,
            UniqueField::FileUrl => &mut self.file_url_index,
        }
    }
}

/// Volatile Stage store. Used by tests and the `memory` backend.
///
/// A single mutex serializes writers, which is what makes the uniqueness
/// check and the insert one atomic step.
#[derive(Debug, Default)]
pub struct MemoryStages {
    table: Mutex<MemoryTable>,
}

impl MemoryStages {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryTable> {
        // Mutations validate before touching the maps, so a poisoned table is consistent.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StageStore for MemoryStages {
    fn create(&self, new: &NewStage) -> Result<Stage, StagesError> {
        let mut table = self.lock();

        for (field, value) in new.unique_values() {
            if table.index(field).contains_key(value) {
                return Err(StagesError::ConstraintViolation {
                    field,
                    value: value.to_string(),
                });
            }
        }

        let id = table.next_id;
        let following = id.next()?;
        let stage = new.clone().into_stage(id);

        for (field, value) in new.unique_values() {
            table.index_mut(field).insert(value.to_string(), id);
        }
        table.rows.insert(id, stage.clone());
        table.next_id = following;

        Ok(stage)
    }

    fn list_all(&self) -> Result<Vec<Stage>, StagesError> {
        Ok(self.lock().rows.values().cloned().collect())
    }

    fn get_by_id(&self, id: StageId) -> Result<Option<Stage>, StagesError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    fn delete(&self, id: StageId) -> Result<bool, StagesError> {
        let mut table = self.lock();
        let Some(stage) = table.rows.remove(&id) else {
            return Ok(false);
        };
        for field in [UniqueField::Detalle, UniqueField::FileUrl] {
            if let Some(value) = stage.unique_value(field) {
                table.index_mut(field).remove(value);
            }
        }
        Ok(true)
    }

    fn count(&self) -> Result<usize, StagesError> {
        Ok(self.lock().rows.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn stage(detalle: Option<&str>, file_url: Option<&str>) -> NewStage {
        NewStage::new(
            Some("F-100".to_string()),
            detalle.map(str::to_string),
            file_url.map(str::to_string),
        )
    }

    #[test]
    fn create_assigns_ascending_ids() {
        let store = MemoryStages::new();
        let a = store.create(&stage(Some("A"), None)).unwrap();
        let b = store.create(&stage(Some("B"), None)).unwrap();
        assert_eq!(a.id, StageId(1));
        assert_eq!(b.id, StageId(2));
    }

    #[test]
    fn duplicate_detalle_rejected() {
        let store = MemoryStages::new();
        store.create(&stage(Some("A"), Some("u1"))).unwrap();

        let err = store.create(&stage(Some("A"), Some("u2"))).unwrap_err();
        match err {
            StagesError::ConstraintViolation { field, value } => {
                assert_eq!(field, UniqueField::Detalle);
                assert_eq!(value, "A");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_file_url_rejected_without_consuming_id() {
        let store = MemoryStages::new();
        store.create(&stage(None, Some("u1"))).unwrap();
        assert!(store.create(&stage(None, Some("u1"))).is_err());

        let next = store.create(&stage(None, Some("u2"))).unwrap();
        assert_eq!(next.id, StageId(2));
    }

    #[test]
    fn nulls_never_collide() {
        let store = MemoryStages::new();
        for _ in 0..3 {
            store.create(&NewStage::default()).unwrap();
        }
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn delete_frees_unique_values_but_not_id() {
        let store = MemoryStages::new();
        let first = store.create(&stage(Some("A"), Some("u1"))).unwrap();

        assert!(store.delete(first.id).unwrap());
        assert!(!store.delete(first.id).unwrap());
        assert!(store.get_by_id(first.id).unwrap().is_none());

        let again = store.create(&stage(Some("A"), Some("u1"))).unwrap();
        assert_eq!(again.id, StageId(2));
    }

    #[test]
    fn list_all_in_id_order() {
        let store = MemoryStages::new();
        assert!(store.list_all().unwrap().is_empty());

        for name in ["C", "A", "B"] {
            store.create(&stage(Some(name), None)).unwrap();
        }
        let ids: Vec<i64> = store.list_all().unwrap().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
