//! Typed error handling for decorators
//!
//! Every failure of a render pass is reported through [`DecoratorError`],
//! which groups errors by category so callers can react specifically
//! rather than dealing with opaque `anyhow::Error`s.
//!
//! # Error Categories
//!
//! - [`ConfigurationError`]: invalid decorator definitions, surfaced at boot
//! - [`AdapterError`]: no adapter for a backend, or schema/decorator drift
//! - [`ExpansionError`]: malformed `expand` requests (client-facing)
//! - [`StorageError`]: failures of the backing store while resolving associations
//!
//! # Example
//!
//! ```rust,ignore
//! use decorator::prelude::*;
//!
//! match INVOICE.to_json(&invoice, &options) {
//!     Ok(json) => println!("{}", json),
//!     Err(DecoratorError::Expansion(ExpansionError::AssociationNotFound { property })) => {
//!         println!("cannot expand {}", property);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use crate::core::model::AssociationKind;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type of the decorator engine
#[derive(Debug, Error)]
pub enum DecoratorError {
    /// Invalid decorator or association definitions
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Adapter selection or consistency failures
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Malformed expansion requests
    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    /// Backing store failures
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DecoratorError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            DecoratorError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DecoratorError::Adapter(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DecoratorError::Expansion(_) => StatusCode::BAD_REQUEST,
            DecoratorError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DecoratorError::Configuration(_) => "CONFIGURATION_ERROR",
            DecoratorError::Adapter(e) => e.error_code(),
            DecoratorError::Expansion(e) => e.error_code(),
            DecoratorError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller can fix the error by changing the request
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            DecoratorError::Expansion(ExpansionError::AssociationNotFound { property })
            | DecoratorError::Expansion(ExpansionError::Unexpandable { property }) => {
                Some(serde_json::json!({ "property": property }))
            }
            DecoratorError::Expansion(ExpansionError::UnexpandedAssociationParent {
                child,
                parent,
            }) => Some(serde_json::json!({ "child": child, "parent": parent })),
            _ => None,
        }
    }
}

impl IntoResponse for DecoratorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while defining decorators
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("'{value}' is not a valid value for exec_context")]
    InvalidExecContext { value: String },

    #[error("Invalid association name '{name}': {reason}")]
    InvalidAssociationName { name: String, reason: String },

    #[error("Decorator '{decorator}' has no accessor named '{name}'")]
    MissingAccessor { decorator: String, name: String },

    #[error("Decorator '{decorator}' renders both a property and an association under '{key}'")]
    DuplicateKey { decorator: String, key: String },

    #[error("Decorator '{name}' referenced by '{referenced_by}' is not defined")]
    UnknownDecorator { name: String, referenced_by: String },

    #[error("Decorator '{name}' references itself through its associations")]
    CyclicDecorator { name: String },

    #[error("Failed to parse decorator config{}: {message}", .file.as_ref().map(|f| format!(" '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl From<serde_yaml::Error> for ConfigurationError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigurationError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors raised while resolving associations through adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    /// None of the registered adapters supports the model
    #[error(
        "No adapter found for '{model_type}'. The available adapters are: {}",
        .available.join(", ")
    )]
    NoAdapter {
        model_type: String,
        available: Vec<String>,
    },

    /// The declared association kind disagrees with the store's metadata
    #[error(
        "{decorator}: '{property}' is defined as {actual} in the model, but as {declared} in the decorator"
    )]
    InconsistentType {
        decorator: String,
        property: String,
        declared: AssociationKind,
        actual: AssociationKind,
    },
}

impl AdapterError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AdapterError::NoAdapter { .. } => "NO_ADAPTER",
            AdapterError::InconsistentType { .. } => "INCONSISTENT_ASSOCIATION_TYPE",
        }
    }
}

// =============================================================================
// Expansion Errors
// =============================================================================

/// Errors raised when a caller asks for an invalid expansion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    #[error("The '{property}' association is not defined")]
    AssociationNotFound { property: String },

    #[error("The '{child}' association is expanded, but its parent '{parent}' is not")]
    UnexpandedAssociationParent { child: String, parent: String },

    #[error("Association '{property}' cannot be expanded")]
    Unexpandable { property: String },
}

impl ExpansionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ExpansionError::AssociationNotFound { .. } => "ASSOCIATION_NOT_FOUND",
            ExpansionError::UnexpandedAssociationParent { .. } => "UNEXPANDED_ASSOCIATION_PARENT",
            ExpansionError::Unexpandable { .. } => "UNEXPANDABLE_ASSOCIATION",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by backing stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// An association accessor failed
    #[error("Failed to load '{property}' of {model_type}: {message}")]
    AccessorFailed {
        model_type: String,
        property: String,
        message: String,
    },

    /// A projection query failed
    #[error("Query on '{table}' failed: {message}")]
    QueryFailed { table: String, message: String },

    /// Table is not defined in the store
    #[error("Unknown table '{table}'")]
    UnknownTable { table: String },

    /// Store is not usable (e.g., poisoned lock)
    #[error("Storage backend '{backend}' is unavailable: {message}")]
    Unavailable { backend: String, message: String },
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for render operations
pub type DecoratorResult<T> = Result<T, DecoratorError>;
