//! Model traits defining the domain objects decorators render
//!
//! A [`Model`] is anything a decorator can wrap. Models backed by a
//! relational store additionally expose a [`Record`] view, which gives
//! association adapters access to foreign keys, the association cache and
//! a [`Connection`] for cheap projection queries.

use crate::core::field::FieldValue;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Primary identifier of a model
pub type Identifier = FieldValue;

/// Kind of a singular association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// The foreign key lives on the owner
    BelongsTo,
    /// The foreign key lives on the related record
    HasOne,
}

impl AssociationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::BelongsTo => "belongs_to",
            AssociationKind::HasOne => "has_one",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base trait for every object a decorator can render.
///
/// Accessors are looked up by name so that decorators stay decoupled from
/// concrete model types.
pub trait Model: Send + Sync {
    /// Name of the model type (e.g., "Invoice"), used for type inference
    /// and error messages
    fn model_name(&self) -> &str;

    /// Primary identifier of this instance
    fn id(&self) -> Option<Identifier>;

    /// Read a plain field
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Resolve a singular association
    ///
    /// May hit the backing store. Returns `Ok(None)` when the association
    /// is empty or unknown to the model.
    fn association(&self, _name: &str) -> Result<Option<Arc<dyn Model>>> {
        Ok(None)
    }

    /// Fallback JSON representation, used when an association is expanded
    /// without a decorator
    fn as_json(&self) -> serde_json::Value;

    /// Relational view of this model, if it is backed by a relational store
    fn as_record(&self) -> Option<&dyn Record> {
        None
    }
}

/// Association metadata as reported by the backing store's own schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationMetadata {
    /// Actual relationship kind
    pub kind: AssociationKind,

    /// Foreign key column (on the owner for `belongs_to`, on the related
    /// table for `has_one`)
    pub foreign_key: String,

    /// Owner column the foreign key points at for `has_one`
    pub owner_key: String,

    /// Table holding the related records
    pub related_table: String,

    /// Primary key column of the related table
    pub related_primary_key: String,
}

impl AssociationMetadata {
    /// Metadata for a `belongs_to` association
    pub fn belongs_to(foreign_key: impl Into<String>, related_table: impl Into<String>) -> Self {
        Self {
            kind: AssociationKind::BelongsTo,
            foreign_key: foreign_key.into(),
            owner_key: "id".to_string(),
            related_table: related_table.into(),
            related_primary_key: "id".to_string(),
        }
    }

    /// Metadata for a `has_one` association
    pub fn has_one(foreign_key: impl Into<String>, related_table: impl Into<String>) -> Self {
        Self {
            kind: AssociationKind::HasOne,
            foreign_key: foreign_key.into(),
            owner_key: "id".to_string(),
            related_table: related_table.into(),
            related_primary_key: "id".to_string(),
        }
    }

    /// Primary key of the related table, when it is not `id`
    pub fn related_primary_key(mut self, column: impl Into<String>) -> Self {
        self.related_primary_key = column.into();
        self
    }
}

/// Relational view of a model
pub trait Record: Model {
    /// Table the record was loaded from
    fn table(&self) -> &str;

    /// Primary key column
    fn primary_key(&self) -> &str;

    /// Read a raw column value
    fn read_attribute(&self, column: &str) -> Option<FieldValue>;

    /// Look up the store's metadata for an association
    fn reflect_on_association(&self, name: &str) -> Option<&AssociationMetadata>;

    /// Whether the association is already in the record's association cache
    fn association_loaded(&self, name: &str) -> bool;

    /// Connection used for projection queries
    fn connection(&self) -> &dyn Connection;
}

/// Minimal query surface of a relational store
pub trait Connection: Send + Sync {
    /// Select a single column of the first row matching `filter_column = value`
    ///
    /// Equivalent to `SELECT select FROM table WHERE filter_column = value LIMIT 1`.
    fn pluck_first(
        &self,
        table: &str,
        select: &str,
        filter_column: &str,
        value: &FieldValue,
    ) -> Result<Option<FieldValue>>;
}
