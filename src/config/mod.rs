//! Configuration loading and management
//!
//! Decorators can be declared in YAML instead of code:
//!
//! ```yaml
//! decorators:
//!   - name: CompanyDecorator
//!     properties: [id, name]
//!
//!   - name: CustomerDecorator
//!     include_type: true
//!     properties:
//!       - id
//!       - name: full_name
//!         as: name
//!     timestamps: [created_at]
//!     associations:
//!       - name: company
//!         kind: belongs_to
//!         expandable: true
//!         decorator: CompanyDecorator
//! ```
//!
//! See [`crate::decorator::catalog::DecoratorCatalog`] for turning a config
//! into decorator types.

use crate::core::error::ConfigurationError;
use crate::core::model::AssociationKind;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

/// A plain property, either a bare field name or a detailed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyConfig {
    Name(String),
    Detailed {
        name: String,

        /// Output key
        #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
        as_key: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        exec_context: Option<String>,

        #[serde(default, alias = "render_nil", skip_serializing_if = "Option::is_none")]
        render_absent: Option<bool>,
    },
}

impl PropertyConfig {
    pub fn name(&self) -> &str {
        match self {
            PropertyConfig::Name(name) => name,
            PropertyConfig::Detailed { name, .. } => name,
        }
    }
}

/// Configuration of one association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationConfig {
    pub name: String,

    pub kind: AssociationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expandable: Option<bool>,

    /// Alias `render_nil`
    #[serde(default, alias = "render_nil", skip_serializing_if = "Option::is_none")]
    pub render_absent: Option<bool>,

    /// Name of the decorator rendering the expanded association
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorator: Option<String>,

    /// "decorated" (or "model"), or "decorator"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_context: Option<String>,
}

/// Configuration of one decorator type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratorConfig {
    pub name: String,

    #[serde(default)]
    pub properties: Vec<PropertyConfig>,

    /// Timestamp properties, rendered as seconds since the epoch
    #[serde(default)]
    pub timestamps: Vec<String>,

    /// Add a `type` property
    #[serde(default)]
    pub include_type: bool,

    #[serde(default)]
    pub associations: Vec<AssociationConfig>,
}

/// Complete configuration of the decorators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecoratorsConfig {
    #[serde(default)]
    pub decorators: Vec<DecoratorConfig>,
}

impl DecoratorsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigurationError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigurationError::IoError {
                message: e.to_string(),
            },
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigurationError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Merge another configuration into this one
    ///
    /// A decorator defined in both is replaced in place by `other`'s
    /// definition; new decorators are appended.
    pub fn merge(mut self, other: DecoratorsConfig) -> Self {
        for decorator in other.decorators {
            match self.decorators.iter_mut().find(|d| d.name == decorator.name) {
                Some(existing) => *existing = decorator,
                None => self.decorators.push(decorator),
            }
        }
        self
    }

    /// Find a decorator definition by name
    pub fn find(&self, name: &str) -> Option<&DecoratorConfig> {
        self.decorators.iter().find(|d| d.name == name)
    }
}
