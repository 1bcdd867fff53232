//! # Core Type Definitions
//!
//! This module contains the record model for the Stages service:
//! - Identifier (`StageId`)
//! - Insert shape (`NewStage`) and stored record (`Stage`)
//! - Unique column names (`UniqueField`)
//! - Error types (`StagesError`)
//!
//! The storage shapes are kept apart from the HTTP wire shapes on purpose:
//! `NewStage` has no `id`, `Stage` always has one.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIER
// =============================================================================

/// Primary identifier of a Stage.
///
/// Assigned by the storage layer on create. Ids start at 1, ascend with
/// insertion and are never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub i64);

impl StageId {
    /// The first id handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// The id that follows this one.
    pub fn next(self) -> Result<Self, StagesError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(StagesError::IdSpaceExhausted)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// UNIQUE FIELDS
// =============================================================================

/// The columns that carry a uniqueness constraint when non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UniqueField {
    Detalle,
    FileUrl,
}

impl UniqueField {
    /// Column name as it appears on the wire and in the table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Detalle => "detalle",
            Self::FileUrl => "file_url",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A Stage as submitted for insertion. Carries no id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStage {
    /// Invoice reference. Free text, may repeat.
    pub n_factura: Option<String>,
    /// Description. Unique when present.
    pub detalle: Option<String>,
    /// Resource location. Unique when present.
    pub file_url: Option<String>,
}

impl NewStage {
    /// Create an insert shape from its three optional fields.
    #[must_use]
    pub fn new(
        n_factura: Option<String>,
        detalle: Option<String>,
        file_url: Option<String>,
    ) -> Self {
        Self {
            n_factura,
            detalle,
            file_url,
        }
    }

    /// The non-null values subject to a uniqueness constraint.
    pub fn unique_values(&self) -> impl Iterator<Item = (UniqueField, &str)> {
        [
            (UniqueField::Detalle, self.detalle.as_deref()),
            (UniqueField::FileUrl, self.file_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }

    /// Attach an assigned id, producing the stored record.
    #[must_use]
    pub fn into_stage(self, id: StageId) -> Stage {
        Stage {
            id,
            n_factura: self.n_factura,
            detalle: self.detalle,
            file_url: self.file_url,
        }
    }
}

/// A stored Stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub n_factura: Option<String>,
    pub detalle: Option<String>,
    pub file_url: Option<String>,
}

impl Stage {
    /// Value held in the given unique column, if any.
    #[must_use]
    pub fn unique_value(&self, field: UniqueField) -> Option<&str> {
        match field {
            UniqueField::Detalle => self.detalle.as_deref(),
            UniqueField::FileUrl => self.file_url.as_deref(),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the storage layer.
///
/// Absence is not an error: lookups return `Option`, deletes return `bool`.
#[derive(Debug, Error)]
pub enum StagesError {
    /// A write would duplicate a value that must be unique.
    #[error("Constraint violation: {field} '{value}' already exists")]
    ConstraintViolation { field: UniqueField, value: String },

    /// Every representable id has been handed out.
    #[error("Stage id space exhausted")]
    IdSpaceExhausted,

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The underlying database failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl StagesError {
    /// True for uniqueness failures, which callers treat as client errors.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_values_skip_nulls() {
        let stage = NewStage::new(Some("F-1".into()), None, Some("http://x/a.pdf".into()));
        let values: Vec<_> = stage.unique_values().collect();
        assert_eq!(values, vec![(UniqueField::FileUrl, "http://x/a.pdf")]);
    }

    #[test]
    fn n_factura_is_not_unique() {
        let stage = NewStage::new(Some("F-1".into()), None, None);
        assert_eq!(stage.unique_values().count(), 0);
    }

    #[test]
    fn into_stage_keeps_fields() {
        let new = NewStage::new(Some("F-1".into()), Some("A".into()), None);
        let stage = new.into_stage(StageId(7));
        assert_eq!(stage.id, StageId(7));
        assert_eq!(stage.n_factura.as_deref(), Some("F-1"));
        assert_eq!(stage.unique_value(UniqueField::Detalle), Some("A"));
        assert_eq!(stage.unique_value(UniqueField::FileUrl), None);
    }

    #[test]
    fn next_id_overflow_is_an_error() {
        assert_eq!(StageId(1).next().ok(), Some(StageId(2)));
        assert!(matches!(
            StageId(i64::MAX).next(),
            Err(StagesError::IdSpaceExhausted)
        ));
    }

    #[test]
    fn unique_field_columns() {
        assert_eq!(UniqueField::Detalle.to_string(), "detalle");
        assert_eq!(UniqueField::FileUrl.to_string(), "file_url");
    }

    #[test]
    fn constraint_violation_message() {
        let err = StagesError::ConstraintViolation {
            field: UniqueField::Detalle,
            value: "Entrega A".into(),
        };
        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "Constraint violation: detalle 'Entrega A' already exists"
        );
    }
}
