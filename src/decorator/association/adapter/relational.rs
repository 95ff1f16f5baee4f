//! Adapter for models backed by a relational store
//!
//! Identifiers are computed with as few round trips as possible:
//!
//! - `belongs_to`: the foreign key already on the owner (no query)
//! - `has_one` already in the association cache: read off the cached object
//!   (no query)
//! - `has_one` not loaded: one projection query selecting only the related
//!   primary key
//!
//! Before resolving, the declared association kind is checked against the
//! store's own metadata to catch decorators drifting out of sync with the
//! schema.

use super::{Adapter, AdapterFactory};
use crate::core::error::{AdapterError, DecoratorResult, StorageError};
use crate::core::field::FieldValue;
use crate::core::model::{AssociationKind, AssociationMetadata, Identifier, Model, Record};
use crate::decorator::association::ExecContext;
use crate::decorator::association::binding::Binding;
use std::sync::Arc;

/// Supports models exposing a [`Record`] view
pub struct RelationalAdapterFactory;

impl AdapterFactory for RelationalAdapterFactory {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn supports(&self, model: &dyn Model) -> bool {
        model.as_record().is_some()
    }

    fn build<'a>(&self, binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>> {
        let model = binding.model();
        let Some(record) = model.as_record() else {
            return Err(AdapterError::NoAdapter {
                model_type: model.model_name().to_string(),
                available: vec![self.name().to_string()],
            }
            .into());
        };

        let adapter = RelationalAdapter { binding, record };
        adapter.check_type_consistency()?;

        Ok(Box::new(adapter))
    }
}

pub struct RelationalAdapter<'a> {
    binding: &'a Binding<'a>,
    record: &'a dyn Record,
}

impl RelationalAdapter<'_> {
    fn metadata(&self) -> Option<&AssociationMetadata> {
        self.record
            .reflect_on_association(self.binding.reflection().name())
    }

    fn check_type_consistency(&self) -> Result<(), AdapterError> {
        let reflection = self.binding.reflection();
        match self.metadata() {
            Some(meta) if meta.kind != reflection.kind() => Err(AdapterError::InconsistentType {
                decorator: self.binding.decorator().name().to_string(),
                property: reflection.name().to_string(),
                declared: reflection.kind(),
                actual: meta.kind,
            }),
            _ => Ok(()),
        }
    }

    /// Identifier read off the related object itself
    fn related_identifier(&self) -> DecoratorResult<Option<Identifier>> {
        Ok(self
            .binding
            .associated_object()?
            .and_then(|related| primary_key_of(related.as_ref())))
    }

    fn has_one_identifier(&self, meta: &AssociationMetadata) -> DecoratorResult<Option<Identifier>> {
        let name = self.binding.reflection().name();
        if self.record.association_loaded(name) {
            return self.related_identifier();
        }

        let Some(owner_key) = FieldValue::non_null(self.record.read_attribute(&meta.owner_key))
        else {
            return Ok(None);
        };

        tracing::debug!(
            table = %meta.related_table,
            column = %meta.related_primary_key,
            association = name,
            "Plucking has_one identifier"
        );

        let identifier = self
            .record
            .connection()
            .pluck_first(
                &meta.related_table,
                &meta.related_primary_key,
                &meta.foreign_key,
                &owner_key,
            )
            .map_err(|e| StorageError::QueryFailed {
                table: meta.related_table.clone(),
                message: format!("{:#}", e),
            })?;

        Ok(FieldValue::non_null(identifier))
    }
}

impl Adapter for RelationalAdapter<'_> {
    fn identifier(&self) -> DecoratorResult<Option<Identifier>> {
        if self.binding.reflection().exec_context() == ExecContext::Decorator {
            return self.related_identifier();
        }

        let Some(meta) = self.metadata() else {
            tracing::trace!(
                association = self.binding.reflection().name(),
                "No store metadata, reading identifier from the related object"
            );
            return self.related_identifier();
        };

        match meta.kind {
            AssociationKind::BelongsTo => Ok(FieldValue::non_null(
                self.record.read_attribute(&meta.foreign_key),
            )),
            AssociationKind::HasOne => self.has_one_identifier(meta),
        }
    }

    fn full_object(&self) -> DecoratorResult<Option<Arc<dyn Model>>> {
        self.binding.associated_object()
    }
}

fn primary_key_of(related: &dyn Model) -> Option<Identifier> {
    match related.as_record() {
        Some(record) => FieldValue::non_null(record.read_attribute(record.primary_key())),
        None => related.id(),
    }
}
