//! Core module containing the model abstraction, field values and errors

pub mod error;
pub mod field;
pub mod model;
pub mod object;
pub mod query;

pub use error::{
    AdapterError, ConfigurationError, DecoratorError, DecoratorResult, ExpansionError, StorageError,
};
pub use field::FieldValue;
pub use model::{AssociationKind, AssociationMetadata, Connection, Identifier, Model, Record};
pub use object::Object;
pub use query::QueryParams;
