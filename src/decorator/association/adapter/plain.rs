//! Adapter for models without backend awareness

use super::{Adapter, AdapterFactory};
use crate::core::error::DecoratorResult;
use crate::core::model::{Identifier, Model};
use crate::decorator::association::binding::Binding;
use std::sync::Arc;

/// Supports every model; reads the identifier off the related object
pub struct PlainAdapterFactory;

impl AdapterFactory for PlainAdapterFactory {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn supports(&self, _model: &dyn Model) -> bool {
        true
    }

    fn build<'a>(&self, binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>> {
        Ok(Box::new(PlainAdapter { binding }))
    }
}

pub struct PlainAdapter<'a> {
    binding: &'a Binding<'a>,
}

impl Adapter for PlainAdapter<'_> {
    fn identifier(&self) -> DecoratorResult<Option<Identifier>> {
        Ok(self.binding.associated_object()?.and_then(|related| related.id()))
    }

    fn full_object(&self) -> DecoratorResult<Option<Arc<dyn Model>>> {
        self.binding.associated_object()
    }
}
