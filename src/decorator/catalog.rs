//! Decorator types built from configuration
//!
//! Decorators reference each other by name; the catalog builds them in
//! dependency order so every `decorator` option points at a finished type.
//! Accessors for decorator-context properties cannot be expressed in YAML
//! and are supplied through [`CatalogBuilder::method`] and
//! [`CatalogBuilder::association_method`].

use super::association::{ExecContext, ReflectionOptions};
use super::{AssociationGetter, DecoratorBuilder, DecoratorType, FieldGetter, PropertyOptions, RenderOptions};
use crate::config::{DecoratorConfig, DecoratorsConfig, PropertyConfig};
use crate::core::error::{ConfigurationError, DecoratorResult};
use crate::core::field::FieldValue;
use crate::core::model::Model;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type AccessorKey = (String, String);

/// Registry of named decorator types
#[derive(Debug, Clone, Default)]
pub struct DecoratorCatalog {
    decorators: IndexMap<String, Arc<DecoratorType>>,
}

impl DecoratorCatalog {
    /// Start building a catalog from a configuration
    pub fn builder(config: DecoratorsConfig) -> CatalogBuilder {
        CatalogBuilder {
            config,
            field_methods: HashMap::new(),
            association_methods: HashMap::new(),
        }
    }

    /// Build a catalog that needs no accessors
    pub fn from_config(config: DecoratorsConfig) -> Result<Self, ConfigurationError> {
        Self::builder(config).build()
    }

    pub fn get(&self, name: &str) -> Option<Arc<DecoratorType>> {
        self.decorators.get(name).cloned()
    }

    /// Names of the decorators, in configuration order
    pub fn names(&self) -> Vec<&str> {
        self.decorators.keys().map(String::as_str).collect()
    }

    /// Render `model` with the decorator called `name`
    pub fn render(&self, name: &str, model: &dyn Model, options: &RenderOptions) -> DecoratorResult<Value> {
        let decorator = self
            .decorators
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownDecorator {
                name: name.to_string(),
                referenced_by: "render".to_string(),
            })?;

        decorator.to_json(model, options)
    }
}

/// Builder for [`DecoratorCatalog`]
pub struct CatalogBuilder {
    config: DecoratorsConfig,
    field_methods: HashMap<AccessorKey, FieldGetter>,
    association_methods: HashMap<AccessorKey, AssociationGetter>,
}

impl CatalogBuilder {
    /// Define a field accessor on decorator `decorator`
    pub fn method<F>(mut self, decorator: impl Into<String>, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&dyn Model) -> Option<FieldValue> + Send + Sync + 'static,
    {
        self.field_methods
            .insert((decorator.into(), name.into()), Arc::new(getter));
        self
    }

    /// Define an association accessor on decorator `decorator`
    pub fn association_method<F>(
        mut self,
        decorator: impl Into<String>,
        name: impl Into<String>,
        getter: F,
    ) -> Self
    where
        F: Fn(&dyn Model) -> anyhow::Result<Option<Arc<dyn Model>>> + Send + Sync + 'static,
    {
        self.association_methods
            .insert((decorator.into(), name.into()), Arc::new(getter));
        self
    }

    /// Build every configured decorator
    ///
    /// Accessors registered for a decorator missing from the configuration
    /// fail the build.
    pub fn build(self) -> Result<DecoratorCatalog, ConfigurationError> {
        let unknown_owner = self
            .field_methods
            .keys()
            .chain(self.association_methods.keys())
            .map(|(owner, _)| owner)
            .find(|owner| self.config.find(owner).is_none());
        if let Some(owner) = unknown_owner {
            return Err(ConfigurationError::UnknownDecorator {
                name: owner.clone(),
                referenced_by: "method".to_string(),
            });
        }

        let mut built: HashMap<String, Arc<DecoratorType>> = HashMap::new();
        let mut visiting = HashSet::new();

        for config in &self.config.decorators {
            self.build_one(config, &mut built, &mut visiting)?;
        }

        let decorators = self
            .config
            .decorators
            .iter()
            .filter_map(|config| {
                built
                    .get(&config.name)
                    .map(|decorator| (config.name.clone(), Arc::clone(decorator)))
            })
            .collect::<IndexMap<_, _>>();

        tracing::debug!(decorators = decorators.len(), "Decorator catalog built");

        Ok(DecoratorCatalog { decorators })
    }

    fn build_one(
        &self,
        config: &DecoratorConfig,
        built: &mut HashMap<String, Arc<DecoratorType>>,
        visiting: &mut HashSet<String>,
    ) -> Result<Arc<DecoratorType>, ConfigurationError> {
        if let Some(decorator) = built.get(&config.name) {
            return Ok(Arc::clone(decorator));
        }
        if !visiting.insert(config.name.clone()) {
            return Err(ConfigurationError::CyclicDecorator {
                name: config.name.clone(),
            });
        }

        let mut builder = DecoratorType::builder(config.name.clone());

        if config.include_type {
            builder = builder.with_type();
        }
        for property in &config.properties {
            builder = builder.property_with(property.name(), property_options(property)?);
        }
        for timestamp in &config.timestamps {
            builder = builder.timestamp(timestamp.clone(), PropertyOptions::new());
        }
        builder = self.attach_accessors(&config.name, builder);

        for association in &config.associations {
            let mut options = ReflectionOptions::new()
                .expandable(association.expandable.unwrap_or(false))
                .render_absent(association.render_absent.unwrap_or(false))
                .exec_context(parse_exec_context(association.exec_context.as_deref())?);

            if let Some(name) = &association.decorator {
                let referenced = self.config.find(name).ok_or_else(|| {
                    ConfigurationError::UnknownDecorator {
                        name: name.clone(),
                        referenced_by: config.name.clone(),
                    }
                })?;
                options = options.decorator(self.build_one(referenced, built, visiting)?);
            }

            builder = builder.declare(association.kind, association.name.clone(), options)?;
        }

        let decorator = builder.build()?;
        visiting.remove(&config.name);
        built.insert(config.name.clone(), Arc::clone(&decorator));

        Ok(decorator)
    }

    fn attach_accessors(&self, decorator: &str, mut builder: DecoratorBuilder) -> DecoratorBuilder {
        for ((owner, name), getter) in &self.field_methods {
            if owner == decorator {
                let getter = Arc::clone(getter);
                builder = builder.method(name.clone(), move |model| getter(model));
            }
        }
        for ((owner, name), getter) in &self.association_methods {
            if owner == decorator {
                let getter = Arc::clone(getter);
                builder = builder.association_method(name.clone(), move |model| getter(model));
            }
        }
        builder
    }
}

fn parse_exec_context(value: Option<&str>) -> Result<ExecContext, ConfigurationError> {
    value.map(str::parse::<ExecContext>).transpose().map(Option::unwrap_or_default)
}

fn property_options(property: &PropertyConfig) -> Result<PropertyOptions, ConfigurationError> {
    let PropertyConfig::Detailed {
        as_key,
        exec_context,
        render_absent,
        ..
    } = property
    else {
        return Ok(PropertyOptions::new());
    };

    let mut options = PropertyOptions::new().exec_context(parse_exec_context(exec_context.as_deref())?);
    if let Some(key) = as_key {
        options = options.as_key(key.clone());
    }
    if let Some(render_absent) = render_absent {
        options = options.render_absent(*render_absent);
    }
    Ok(options)
}
