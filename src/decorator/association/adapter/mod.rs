//! Storage-backend adapters for association resolution
//!
//! An [`Adapter`] computes the identifier of an association (cheaply, when
//! the backend allows it) or the full related object. Adapters are created
//! per binding by the first [`AdapterFactory`] in an [`AdapterRegistry`]
//! whose `supports` predicate accepts the decorated model, and are dropped
//! right after use.

pub mod plain;
pub mod relational;

use crate::core::error::{AdapterError, DecoratorResult};
use crate::core::model::{Identifier, Model};
use crate::decorator::association::binding::Binding;
use std::sync::{Arc, LazyLock};

pub use plain::PlainAdapterFactory;
pub use relational::RelationalAdapterFactory;

/// Resolves one association of one decorated model
pub trait Adapter {
    /// Identifier of the related object, without materializing it when avoidable
    fn identifier(&self) -> DecoratorResult<Option<Identifier>>;

    /// The related object itself (may trigger a fetch)
    fn full_object(&self) -> DecoratorResult<Option<Arc<dyn Model>>>;
}

/// Creates adapters for the models it supports
pub trait AdapterFactory: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Cheap, side-effect free check on the decorated model
    fn supports(&self, model: &dyn Model) -> bool;

    /// Build an adapter for `binding`
    fn build<'a>(&self, binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>>;
}

static DEFAULT_REGISTRY: LazyLock<Arc<AdapterRegistry>> =
    LazyLock::new(|| Arc::new(AdapterRegistry::default()));

/// Ordered list of adapter factories
///
/// Factories are consulted in registration order and the first one that
/// supports the model wins.
#[derive(Clone)]
pub struct AdapterRegistry {
    factories: Vec<Arc<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Shared instance of the default registry
    pub fn shared_default() -> Arc<AdapterRegistry> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    /// Append a factory after the existing ones
    pub fn register(mut self, factory: impl AdapterFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Names of the registered factories, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Instantiate the adapter for a binding
    pub fn load_for<'a>(&self, binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>> {
        let model = binding.model();

        let Some(factory) = self.factories.iter().find(|f| f.supports(model)) else {
            return Err(AdapterError::NoAdapter {
                model_type: model.model_name().to_string(),
                available: self.names().into_iter().map(String::from).collect(),
            }
            .into());
        };

        tracing::trace!(
            adapter = factory.name(),
            model = model.model_name(),
            association = binding.reflection().name(),
            "Selected association adapter"
        );

        factory.build(binding)
    }
}

impl Default for AdapterRegistry {
    /// Relational records first, then any other model
    fn default() -> Self {
        Self::empty()
            .register(RelationalAdapterFactory)
            .register(PlainAdapterFactory)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("factories", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DecoratorError;
    use crate::core::field::FieldValue;
    use crate::core::object::Object;
    use crate::decorator::association::ReflectionOptions;
    use crate::decorator::{Decorated, DecoratorType};

    /// Returns a fixed identifier, to tell which factory won
    struct FixedAdapter(&'static str);

    impl Adapter for FixedAdapter {
        fn identifier(&self) -> DecoratorResult<Option<Identifier>> {
            Ok(Some(FieldValue::from(self.0)))
        }

        fn full_object(&self) -> DecoratorResult<Option<Arc<dyn Model>>> {
            Ok(None)
        }
    }

    struct FixedFactory(&'static str);

    impl AdapterFactory for FixedFactory {
        fn name(&self) -> &'static str {
            self.0
        }

        fn supports(&self, _model: &dyn Model) -> bool {
            true
        }

        fn build<'a>(&self, _binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>> {
            Ok(Box::new(FixedAdapter(self.0)))
        }
    }

    struct NeverFactory;

    impl AdapterFactory for NeverFactory {
        fn name(&self) -> &'static str {
            "never"
        }

        fn supports(&self, _model: &dyn Model) -> bool {
            false
        }

        fn build<'a>(&self, _binding: &'a Binding<'a>) -> DecoratorResult<Box<dyn Adapter + 'a>> {
            unreachable!("never supports anything")
        }
    }

    fn decorator() -> Arc<DecoratorType> {
        DecoratorType::builder("InvoiceDecorator")
            .belongs_to("customer", ReflectionOptions::new())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_order() {
        assert_eq!(AdapterRegistry::default().names(), vec!["relational", "plain"]);
    }

    #[test]
    fn test_first_supporting_factory_wins() {
        let decorator = decorator();
        let invoice = Object::new("Invoice");
        let decorated = Decorated::new(&decorator, &invoice);
        let reflection = decorator.association("customer").unwrap();
        let binding = Binding::new(reflection, &decorated);

        let registry = AdapterRegistry::empty()
            .register(NeverFactory)
            .register(FixedFactory("first"))
            .register(FixedFactory("second"));

        for _ in 0..3 {
            let adapter = registry.load_for(&binding).unwrap();
            assert_eq!(adapter.identifier().unwrap(), Some(FieldValue::from("first")));
        }
    }

    #[test]
    fn test_no_adapter_is_an_error() {
        let decorator = decorator();
        let invoice = Object::new("Invoice");
        let decorated = Decorated::new(&decorator, &invoice);
        let reflection = decorator.association("customer").unwrap();
        let binding = Binding::new(reflection, &decorated);

        let registry = AdapterRegistry::empty().register(NeverFactory);
        let err = registry.load_for(&binding).err().expect("no adapter should match");

        match err {
            DecoratorError::Adapter(AdapterError::NoAdapter {
                model_type,
                available,
            }) => {
                assert_eq!(model_type, "Invoice");
                assert_eq!(available, vec!["never".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
