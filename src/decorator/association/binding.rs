//! Runtime link between a declared association and one decorated model

use crate::core::error::{DecoratorResult, ExpansionError, StorageError};
use crate::core::model::Model;
use crate::decorator::association::{ExecContext, Reflection};
use crate::decorator::{Decorated, DecoratorType, RenderOptions};
use serde_json::Value;
use std::sync::Arc;

/// Outcome of rendering one association
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// No key is emitted
    Omitted,
    /// The value to emit under the association's name
    Value(Value),
}

/// Binds a [`Reflection`] to one decorated model for a single render
pub struct Binding<'a> {
    reflection: &'a Reflection,
    decorated: &'a Decorated<'a>,
}

impl<'a> Binding<'a> {
    pub fn new(reflection: &'a Reflection, decorated: &'a Decorated<'a>) -> Self {
        Self {
            reflection,
            decorated,
        }
    }

    pub fn reflection(&self) -> &'a Reflection {
        self.reflection
    }

    /// The decorator type rendering the owner
    pub fn decorator(&self) -> &'a DecoratorType {
        self.decorated.decorator()
    }

    /// The owner model
    pub fn model(&self) -> &'a dyn Model {
        self.decorated.model()
    }

    /// Resolve the related object through the configured accessor
    pub fn associated_object(&self) -> DecoratorResult<Option<Arc<dyn Model>>> {
        let name = self.reflection.name();

        let result = match self.reflection.exec_context() {
            ExecContext::Decorated => self.model().association(name),
            ExecContext::Decorator => self.decorated.call_association(name),
        };

        result.map_err(|e| {
            StorageError::AccessorFailed {
                model_type: self.model().model_name().to_string(),
                property: name.to_string(),
                message: format!("{:#}", e),
            }
            .into()
        })
    }

    /// Render the association for the given options
    ///
    /// Expanded when the association's own name is requested, otherwise
    /// rendered as the bare identifier.
    pub fn render(&self, options: &RenderOptions) -> DecoratorResult<Rendered> {
        let adapter = options.adapters().load_for(self)?;

        if options.expand().contains(self.reflection.name()) {
            match adapter.full_object()? {
                Some(related) => self.expanded_value(related.as_ref(), options),
                None => Ok(self.absent()),
            }
        } else {
            match adapter.identifier()? {
                Some(identifier) => Ok(Rendered::Value(identifier.to_json())),
                None => Ok(self.absent()),
            }
        }
    }

    fn absent(&self) -> Rendered {
        if self.reflection.renders_absent() {
            Rendered::Value(Value::Null)
        } else {
            Rendered::Omitted
        }
    }

    fn expanded_value(&self, related: &dyn Model, options: &RenderOptions) -> DecoratorResult<Rendered> {
        let name = self.reflection.name();
        if !self.reflection.is_expandable() {
            return Err(ExpansionError::Unexpandable {
                property: name.to_string(),
            }
            .into());
        }

        let nested = options.narrowed(options.expand().flatten(name));

        let value = match &self.reflection.options().decorator {
            Some(spec) => {
                let decorator = spec.resolve(related);
                tracing::debug!(
                    association = name,
                    decorator = decorator.name(),
                    "Expanding association"
                );
                decorator.to_json(related, &nested)?
            }
            None => related.as_json(),
        };

        Ok(Rendered::Value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DecoratorError;
    use crate::core::object::Object;
    use crate::decorator::association::{ExpandSet, ReflectionOptions};
    use serde_json::json;

    fn customer_decorator() -> Arc<DecoratorType> {
        DecoratorType::builder("CustomerDecorator")
            .property("id")
            .property("full_name")
            .build()
            .unwrap()
    }

    fn invoice() -> Object {
        Object::new("Invoice").with_association(
            "customer",
            Object::new("Customer").with("id", "c1").with("full_name", "John Doe"),
        )
    }

    fn render(decorator: &DecoratorType, model: &dyn Model, expand: &[&str]) -> DecoratorResult<Rendered> {
        let decorated = Decorated::new(decorator, model);
        let binding = Binding::new(decorator.association("customer").unwrap(), &decorated);
        binding.render(&RenderOptions::new().with_expand(ExpandSet::new(expand)))
    }

    #[test]
    fn test_unexpanded_renders_identifier() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .belongs_to("customer", ReflectionOptions::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            render(&decorator, &invoice(), &[]).unwrap(),
            Rendered::Value(json!("c1"))
        );
    }

    #[test]
    fn test_expanded_renders_nested_decorator() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .belongs_to(
                "customer",
                ReflectionOptions::new()
                    .expandable(true)
                    .decorator(customer_decorator()),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            render(&decorator, &invoice(), &["customer"]).unwrap(),
            Rendered::Value(json!({"id": "c1", "full_name": "John Doe"}))
        );
    }

    #[test]
    fn test_expanded_without_decorator_uses_as_json() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .belongs_to("customer", ReflectionOptions::new().expandable(true))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            render(&decorator, &invoice(), &["customer"]).unwrap(),
            Rendered::Value(json!({"id": "c1", "full_name": "John Doe"}))
        );
    }

    #[test]
    fn test_unexpandable_fails() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .belongs_to("customer", ReflectionOptions::new().decorator(customer_decorator()))
            .unwrap()
            .build()
            .unwrap();

        let err = render(&decorator, &invoice(), &["customer"]).unwrap_err();
        assert!(matches!(
            err,
            DecoratorError::Expansion(ExpansionError::Unexpandable { ref property })
                if property == "customer"
        ));
    }

    #[test]
    fn test_absent_association() {
        let omitting = DecoratorType::builder("InvoiceDecorator")
            .belongs_to("customer", ReflectionOptions::new().expandable(true))
            .unwrap()
            .build()
            .unwrap();
        let rendering = DecoratorType::builder("InvoiceDecorator")
            .belongs_to(
                "customer",
                ReflectionOptions::new().expandable(true).render_absent(true),
            )
            .unwrap()
            .build()
            .unwrap();
        let invoice = Object::new("Invoice").without_association("customer");

        assert_eq!(render(&omitting, &invoice, &[]).unwrap(), Rendered::Omitted);
        assert_eq!(render(&omitting, &invoice, &["customer"]).unwrap(), Rendered::Omitted);
        assert_eq!(
            render(&rendering, &invoice, &[]).unwrap(),
            Rendered::Value(Value::Null)
        );
    }

    #[test]
    fn test_decorator_exec_context() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .association_method("customer", |_model| {
                Ok(Some(Object::new("Customer").with("id", "customer_on_decorator").shared()))
            })
            .belongs_to(
                "customer",
                ReflectionOptions::new().exec_context(ExecContext::Decorator),
            )
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            render(&decorator, &invoice(), &[]).unwrap(),
            Rendered::Value(json!("customer_on_decorator"))
        );
    }

    #[test]
    fn test_accessor_failure_is_storage_error() {
        let decorator = DecoratorType::builder("InvoiceDecorator")
            .association_method("customer", |_model| Err(anyhow::anyhow!("connection reset")))
            .belongs_to(
                "customer",
                ReflectionOptions::new().exec_context(ExecContext::Decorator),
            )
            .unwrap()
            .build()
            .unwrap();

        let err = render(&decorator, &invoice(), &[]).unwrap_err();
        assert!(matches!(
            err,
            DecoratorError::Storage(StorageError::AccessorFailed { .. })
        ));
        assert!(err.to_string().contains("connection reset"));
    }
}
