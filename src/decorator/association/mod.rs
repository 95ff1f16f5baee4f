//! Association declarations
//!
//! A [`Reflection`] is the immutable declaration of one singular association
//! (name, kind, options). Reflections are registered on a
//! [`DecoratorType`](crate::decorator::DecoratorType) when it is built and
//! are shared read-only by every render of that type.

pub mod adapter;
pub mod binding;
pub mod expansion;

use crate::core::error::ConfigurationError;
use crate::core::model::{AssociationKind, Model};
use crate::decorator::DecoratorType;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use adapter::{Adapter, AdapterFactory, AdapterRegistry};
pub use binding::{Binding, Rendered};
pub use expansion::{ExpandSet, ExpansionValidator};

/// Where an accessor is invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecContext {
    /// On the decorator, through an accessor registered on the decorator type
    Decorator,
    /// On the wrapped model
    #[default]
    Decorated,
}

impl FromStr for ExecContext {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "decorator" => Ok(ExecContext::Decorator),
            "decorated" | "model" => Ok(ExecContext::Decorated),
            other => Err(ConfigurationError::InvalidExecContext {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecContext::Decorator => f.write_str("decorator"),
            ExecContext::Decorated => f.write_str("decorated"),
        }
    }
}

/// Computes the decorator for a related object at render time
pub type DecoratorFactory = Arc<dyn Fn(&dyn Model) -> Arc<DecoratorType> + Send + Sync>;

/// How an expanded association is represented
#[derive(Clone)]
pub enum DecoratorSpec {
    /// Always use this decorator
    Static(Arc<DecoratorType>),
    /// Pick the decorator from the related object
    Factory(DecoratorFactory),
}

impl DecoratorSpec {
    /// Resolve the decorator to use for `related`
    pub fn resolve(&self, related: &dyn Model) -> Arc<DecoratorType> {
        match self {
            DecoratorSpec::Static(decorator) => Arc::clone(decorator),
            DecoratorSpec::Factory(factory) => factory(related),
        }
    }
}

impl fmt::Debug for DecoratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoratorSpec::Static(decorator) => {
                f.debug_tuple("Static").field(&decorator.name()).finish()
            }
            DecoratorSpec::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<Arc<DecoratorType>> for DecoratorSpec {
    fn from(decorator: Arc<DecoratorType>) -> Self {
        DecoratorSpec::Static(decorator)
    }
}

/// Options of an association declaration
///
/// Defaults: not expandable, absent associations omitted, no decorator,
/// accessor invoked on the model.
#[derive(Debug, Clone, Default)]
pub struct ReflectionOptions {
    pub expandable: bool,
    pub render_absent: bool,
    pub decorator: Option<DecoratorSpec>,
    pub exec_context: ExecContext,
}

impl ReflectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    pub fn render_absent(mut self, render_absent: bool) -> Self {
        self.render_absent = render_absent;
        self
    }

    pub fn decorator(mut self, decorator: Arc<DecoratorType>) -> Self {
        self.decorator = Some(DecoratorSpec::Static(decorator));
        self
    }

    pub fn decorator_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn(&dyn Model) -> Arc<DecoratorType> + Send + Sync + 'static,
    {
        self.decorator = Some(DecoratorSpec::Factory(Arc::new(factory)));
        self
    }

    pub fn exec_context(mut self, exec_context: ExecContext) -> Self {
        self.exec_context = exec_context;
        self
    }
}

/// Declaration of one association on a decorator type
#[derive(Debug, Clone)]
pub struct Reflection {
    kind: AssociationKind,
    name: String,
    options: ReflectionOptions,
}

impl Reflection {
    /// Declare an association
    ///
    /// Names must be non-empty and may not contain `.` or `,`, which are the
    /// separators of expand requests.
    pub fn new(
        kind: AssociationKind,
        name: impl Into<String>,
        options: ReflectionOptions,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();

        let reason = if name.trim().is_empty() {
            Some("name cannot be blank")
        } else if name.contains('.') {
            Some("name cannot contain '.'")
        } else if name.contains(',') {
            Some("name cannot contain ','")
        } else if name.trim() != name {
            Some("name cannot have surrounding whitespace")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(ConfigurationError::InvalidAssociationName {
                name,
                reason: reason.to_string(),
            });
        }

        Ok(Self {
            kind,
            name,
            options,
        })
    }

    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ReflectionOptions {
        &self.options
    }

    pub fn is_expandable(&self) -> bool {
        self.options.expandable
    }

    pub fn renders_absent(&self) -> bool {
        self.options.render_absent
    }

    pub fn exec_context(&self) -> ExecContext {
        self.options.exec_context
    }
}
