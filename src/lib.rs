//! # This-Decorator
//!
//! JSON decorators for domain objects, with associations that clients can
//! selectively expand.
//!
//! ## Features
//!
//! - **Declarative Decorators**: properties, timestamps, type names and
//!   associations declared once on an immutable [`DecoratorType`](decorator::DecoratorType)
//! - **Selective Expansion**: `?expand=customer,customer.company` renders
//!   nested objects, everything else stays a bare identifier
//! - **Minimal Fetches**: relational records resolve `belongs_to` identifiers
//!   from the foreign key and `has_one` identifiers with a single projection query
//! - **Pluggable Adapters**: an ordered registry picks the backend adapter per model
//! - **Configuration-Based**: decorators can be declared in YAML
//! - **Typed Errors**: every failure maps to an HTTP status and error code
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use decorator::prelude::*;
//!
//! let company = DecoratorType::builder("CompanyDecorator")
//!     .property("id")
//!     .property("name")
//!     .build()?;
//!
//! let customer = DecoratorType::builder("CustomerDecorator")
//!     .property("id")
//!     .property("full_name")
//!     .belongs_to(
//!         "company",
//!         ReflectionOptions::new().expandable(true).decorator(company),
//!     )?
//!     .build()?;
//!
//! // {"id": "c1", "full_name": "John Doe", "company": "co1"}
//! customer.to_json(&model, &RenderOptions::new())?;
//!
//! // {"id": "c1", "full_name": "John Doe", "company": {"id": "co1", "name": "ACME"}}
//! customer.to_json(&model, &RenderOptions::new().with_expand(ExpandSet::parse("company")))?;
//! ```

pub mod config;
pub mod core;
pub mod decorator;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{
            AdapterError, ConfigurationError, DecoratorError, DecoratorResult, ErrorResponse,
            ExpansionError, StorageError,
        },
        field::FieldValue,
        model::{AssociationKind, AssociationMetadata, Connection, Identifier, Model, Record},
        object::Object,
        query::QueryParams,
    };

    // === Decorators ===
    pub use crate::decorator::{
        Decorated, DecoratorBuilder, DecoratorType, PropertyOptions, RenderOptions,
        catalog::{CatalogBuilder, DecoratorCatalog},
        collection::CollectionDecorator,
        pagination::Page,
    };

    // === Associations ===
    pub use crate::decorator::association::{
        Adapter, AdapterFactory, AdapterRegistry, Binding, DecoratorSpec, ExecContext, ExpandSet,
        Reflection, ReflectionOptions, Rendered,
        adapter::{PlainAdapterFactory, RelationalAdapterFactory},
    };

    // === Config ===
    pub use crate::config::{AssociationConfig, DecoratorConfig, DecoratorsConfig, PropertyConfig};

    // === Storage ===
    pub use crate::storage::{InMemoryStore, StoredRecord, TableSchema};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use serde_json::{Value, json};
}
