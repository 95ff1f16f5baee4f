//! Decorators turning models into JSON representations
//!
//! A [`DecoratorType`] is an immutable schema: the properties to map, the
//! associations that may be expanded and the accessors defined on the
//! decorator itself. It is built once through [`DecoratorBuilder`] and
//! shared (`Arc<DecoratorType>`) by every render.
//!
//! Per-call state lives in [`RenderOptions`], which is passed explicitly
//! down the render tree; a decorator type carries no mutable state and can
//! render many models concurrently.
//!
//! # Example
//!
//! ```rust,ignore
//! let company = DecoratorType::builder("CompanyDecorator")
//!     .property("id")
//!     .property("name")
//!     .build()?;
//!
//! let customer = DecoratorType::builder("CustomerDecorator")
//!     .property("id")
//!     .property("full_name")
//!     .belongs_to("company", ReflectionOptions::new().expandable(true).decorator(company))?
//!     .build()?;
//!
//! let json = customer.to_json(&model, &RenderOptions::new().with_expand(ExpandSet::parse("company")))?;
//! ```

pub mod association;
pub mod catalog;
pub mod collection;
pub mod pagination;
pub mod type_name;

use crate::core::error::{ConfigurationError, DecoratorResult};
use crate::core::field::FieldValue;
use crate::core::model::{AssociationKind, Model};
use association::binding::{Binding, Rendered};
use association::{
    AdapterRegistry, ExecContext, ExpandSet, ExpansionValidator, Reflection, ReflectionOptions,
};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Field accessor defined on a decorator
pub type FieldGetter = Arc<dyn Fn(&dyn Model) -> Option<FieldValue> + Send + Sync>;

/// Association accessor defined on a decorator
pub type AssociationGetter =
    Arc<dyn Fn(&dyn Model) -> anyhow::Result<Option<Arc<dyn Model>>> + Send + Sync>;

/// Options of a plain property
#[derive(Debug, Clone)]
pub struct PropertyOptions {
    /// Output key, defaults to the property name
    pub as_key: Option<String>,
    /// Where the value is read
    pub exec_context: ExecContext,
    /// Emit `null` for absent values instead of omitting the key
    pub render_absent: bool,
}

impl Default for PropertyOptions {
    fn default() -> Self {
        Self {
            as_key: None,
            exec_context: ExecContext::Decorated,
            render_absent: true,
        }
    }
}

impl PropertyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_key(mut self, key: impl Into<String>) -> Self {
        self.as_key = Some(key.into());
        self
    }

    pub fn exec_context(mut self, exec_context: ExecContext) -> Self {
        self.exec_context = exec_context;
        self
    }

    pub fn render_absent(mut self, render_absent: bool) -> Self {
        self.render_absent = render_absent;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PropertySource {
    Field,
    Timestamp,
    TypeName,
}

/// A plain (non-association) property
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    source: PropertySource,
    options: PropertyOptions,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key under which the property is rendered
    pub fn key(&self) -> &str {
        self.options.as_key.as_deref().unwrap_or(&self.name)
    }
}

/// Immutable decorator schema
#[derive(Clone)]
pub struct DecoratorType {
    name: String,
    properties: Vec<Property>,
    associations: IndexMap<String, Reflection>,
    field_methods: HashMap<String, FieldGetter>,
    association_methods: HashMap<String, AssociationGetter>,
}

impl DecoratorType {
    /// Start defining a decorator type
    pub fn builder(name: impl Into<String>) -> DecoratorBuilder {
        DecoratorBuilder {
            schema: DecoratorType {
                name: name.into(),
                properties: Vec::new(),
                associations: IndexMap::new(),
                field_methods: HashMap::new(),
                association_methods: HashMap::new(),
            },
        }
    }

    /// Start defining a subtype of `parent`
    ///
    /// The new type inherits the parent's properties, associations and
    /// accessors; re-declaring an association replaces the inherited one.
    pub fn extend(parent: &DecoratorType, name: impl Into<String>) -> DecoratorBuilder {
        let mut schema = parent.clone();
        schema.name = name.into();
        DecoratorBuilder { schema }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Registered associations, in declaration order
    pub fn associations(&self) -> impl Iterator<Item = &Reflection> {
        self.associations.values()
    }

    /// Look up an association by name
    pub fn association(&self, name: &str) -> Option<&Reflection> {
        self.associations.get(name)
    }

    /// Render `model` into a JSON object
    ///
    /// The expand request is validated before any property or association
    /// is resolved, so a failing request never produces partial output.
    pub fn render(&self, model: &dyn Model, options: &RenderOptions) -> DecoratorResult<Map<String, Value>> {
        let span = tracing::debug_span!(
            "render",
            decorator = %self.name,
            model = model.model_name(),
            expand = options.expand().len()
        );
        let _enter = span.enter();

        ExpansionValidator::new(self).validate(options.expand())?;

        let decorated = Decorated::new(self, model);
        let mut output = Map::new();

        for property in &self.properties {
            if let Some(value) = decorated.render_property(property) {
                output.insert(property.key().to_string(), value);
            }
        }

        for reflection in self.associations.values() {
            let binding = Binding::new(reflection, &decorated);
            if let Rendered::Value(value) = binding.render(options)? {
                output.insert(reflection.name().to_string(), value);
            }
        }

        Ok(output)
    }

    /// Render `model` into a JSON value
    pub fn to_json(&self, model: &dyn Model, options: &RenderOptions) -> DecoratorResult<Value> {
        self.render(model, options).map(Value::Object)
    }
}

impl fmt::Debug for DecoratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorType")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("associations", &self.associations)
            .field("field_methods", &self.field_methods.keys().collect::<Vec<_>>())
            .field(
                "association_methods",
                &self.association_methods.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`DecoratorType`]
pub struct DecoratorBuilder {
    schema: DecoratorType,
}

impl DecoratorBuilder {
    /// Map a model field under its own name
    pub fn property(self, name: impl Into<String>) -> Self {
        self.property_with(name, PropertyOptions::default())
    }

    /// Map a property with explicit options
    pub fn property_with(self, name: impl Into<String>, options: PropertyOptions) -> Self {
        self.push_property(name.into(), PropertySource::Field, options)
    }

    /// Map a timestamp field as seconds since the epoch
    pub fn timestamp(self, name: impl Into<String>, options: PropertyOptions) -> Self {
        self.push_property(name.into(), PropertySource::Timestamp, options)
    }

    /// Add a `type` property inferred from the model name
    pub fn with_type(self) -> Self {
        self.push_property(
            "type".to_string(),
            PropertySource::TypeName,
            PropertyOptions::new().render_absent(false),
        )
    }

    /// Define a field accessor on the decorator
    pub fn method<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&dyn Model) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.schema.field_methods.insert(name.into(), Arc::new(getter));
        self
    }

    /// Define an association accessor on the decorator
    pub fn association_method<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&dyn Model) -> anyhow::Result<Option<Arc<dyn Model>>> + Send + Sync + 'static,
    {
        self.schema
            .association_methods
            .insert(name.into(), Arc::new(getter));
        self
    }

    /// Declare an association
    ///
    /// Re-declaring a name replaces the previous declaration.
    pub fn declare(
        mut self,
        kind: AssociationKind,
        name: impl Into<String>,
        options: ReflectionOptions,
    ) -> Result<Self, ConfigurationError> {
        let reflection = Reflection::new(kind, name, options)?;
        self.schema
            .associations
            .insert(reflection.name().to_string(), reflection);
        Ok(self)
    }

    pub fn belongs_to(
        self,
        name: impl Into<String>,
        options: ReflectionOptions,
    ) -> Result<Self, ConfigurationError> {
        self.declare(AssociationKind::BelongsTo, name, options)
    }

    pub fn has_one(
        self,
        name: impl Into<String>,
        options: ReflectionOptions,
    ) -> Result<Self, ConfigurationError> {
        self.declare(AssociationKind::HasOne, name, options)
    }

    /// Finish the definition
    ///
    /// Fails if a decorator-context property or association has no matching
    /// accessor, or if a property key is also an association name.
    pub fn build(self) -> Result<Arc<DecoratorType>, ConfigurationError> {
        let schema = self.schema;

        if let Some(property) = schema
            .properties
            .iter()
            .find(|p| schema.associations.contains_key(p.key()))
        {
            return Err(ConfigurationError::DuplicateKey {
                key: property.key().to_string(),
                decorator: schema.name,
            });
        }

        let missing_field = schema.properties.iter().find(|p| {
            p.options.exec_context == ExecContext::Decorator
                && p.source != PropertySource::TypeName
                && !schema.field_methods.contains_key(&p.name)
        });
        let missing_association = schema.associations.values().find(|r| {
            r.exec_context() == ExecContext::Decorator
                && !schema.association_methods.contains_key(r.name())
        });

        let missing = missing_field
            .map(|p| p.name.clone())
            .or_else(|| missing_association.map(|r| r.name().to_string()));

        if let Some(name) = missing {
            return Err(ConfigurationError::MissingAccessor {
                decorator: schema.name,
                name,
            });
        }

        Ok(Arc::new(schema))
    }

    fn push_property(mut self, name: String, source: PropertySource, options: PropertyOptions) -> Self {
        let key = options.as_key.clone().unwrap_or_else(|| name.clone());
        self.schema.properties.retain(|p| p.key() != key);
        self.schema.properties.push(Property {
            name,
            source,
            options,
        });
        self
    }
}

/// A model wrapped by a decorator for one render
pub struct Decorated<'a> {
    decorator: &'a DecoratorType,
    model: &'a dyn Model,
}

impl<'a> Decorated<'a> {
    pub fn new(decorator: &'a DecoratorType, model: &'a dyn Model) -> Self {
        Self { decorator, model }
    }

    pub fn decorator(&self) -> &'a DecoratorType {
        self.decorator
    }

    pub fn model(&self) -> &'a dyn Model {
        self.model
    }

    /// Invoke a field accessor defined on the decorator
    pub fn call_field(&self, name: &str) -> Option<FieldValue> {
        self.decorator
            .field_methods
            .get(name)
            .and_then(|getter| getter(self.model))
    }

    /// Invoke an association accessor defined on the decorator
    pub fn call_association(&self, name: &str) -> anyhow::Result<Option<Arc<dyn Model>>> {
        match self.decorator.association_methods.get(name) {
            Some(getter) => getter(self.model),
            None => Ok(None),
        }
    }

    fn read(&self, name: &str, exec_context: ExecContext) -> Option<FieldValue> {
        match exec_context {
            ExecContext::Decorated => self.model.field(name),
            ExecContext::Decorator => self.call_field(name),
        }
    }

    fn render_property(&self, property: &Property) -> Option<Value> {
        let value = match property.source {
            PropertySource::Field => self.read(&property.name, property.options.exec_context),
            PropertySource::Timestamp => self
                .read(&property.name, property.options.exec_context)
                .map(FieldValue::to_epoch),
            PropertySource::TypeName => Some(FieldValue::String(type_name::infer(
                self.model.model_name(),
            ))),
        };

        match FieldValue::non_null(value) {
            Some(value) => Some(value.to_json()),
            None if property.options.render_absent => Some(Value::Null),
            None => None,
        }
    }
}

/// Per-call render context
///
/// Threaded explicitly through nested renders; each expanded association
/// receives a narrowed copy.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    expand: ExpandSet,
    adapters: Arc<AdapterRegistry>,
}

impl RenderOptions {
    /// No expansion, default adapters
    pub fn new() -> Self {
        Self {
            expand: ExpandSet::default(),
            adapters: AdapterRegistry::shared_default(),
        }
    }

    pub fn with_expand(mut self, expand: ExpandSet) -> Self {
        self.expand = expand;
        self
    }

    pub fn with_adapters(mut self, adapters: Arc<AdapterRegistry>) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn expand(&self) -> &ExpandSet {
        &self.expand
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Same options with a different expand set
    pub fn narrowed(&self, expand: ExpandSet) -> Self {
        Self {
            expand,
            adapters: Arc::clone(&self.adapters),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}
