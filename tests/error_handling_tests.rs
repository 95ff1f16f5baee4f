//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses are properly formatted
//! - Error conversions work correctly
//! - Error matching allows clients to handle specific cases

use axum::http::StatusCode;
use axum::response::IntoResponse;
use decorator::prelude::*;

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_expansion_errors_return_400() {
        let errors = [
            ExpansionError::AssociationNotFound {
                property: "bogus".to_string(),
            },
            ExpansionError::UnexpandedAssociationParent {
                child: "customer.company".to_string(),
                parent: "customer".to_string(),
            },
            ExpansionError::Unexpandable {
                property: "customer".to_string(),
            },
        ];

        for err in errors {
            let err = DecoratorError::from(err);
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_adapter_errors_return_500() {
        let err = DecoratorError::Adapter(AdapterError::NoAdapter {
            model_type: "Invoice".to_string(),
            available: vec!["relational".to_string()],
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_configuration_error_returns_500() {
        let err = DecoratorError::Configuration(ConfigurationError::InvalidExecContext {
            value: "controller".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_error_returns_500() {
        let err = DecoratorError::Storage(StorageError::UnknownTable {
            table: "invoices".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases: Vec<(DecoratorError, &str)> = vec![
            (
                ExpansionError::AssociationNotFound {
                    property: "x".to_string(),
                }
                .into(),
                "ASSOCIATION_NOT_FOUND",
            ),
            (
                ExpansionError::UnexpandedAssociationParent {
                    child: "a.b".to_string(),
                    parent: "a".to_string(),
                }
                .into(),
                "UNEXPANDED_ASSOCIATION_PARENT",
            ),
            (
                ExpansionError::Unexpandable {
                    property: "x".to_string(),
                }
                .into(),
                "UNEXPANDABLE_ASSOCIATION",
            ),
            (
                AdapterError::NoAdapter {
                    model_type: "X".to_string(),
                    available: vec![],
                }
                .into(),
                "NO_ADAPTER",
            ),
            (
                AdapterError::InconsistentType {
                    decorator: "D".to_string(),
                    property: "p".to_string(),
                    declared: AssociationKind::HasOne,
                    actual: AssociationKind::BelongsTo,
                }
                .into(),
                "INCONSISTENT_ASSOCIATION_TYPE",
            ),
            (
                ConfigurationError::CyclicDecorator {
                    name: "A".to_string(),
                }
                .into(),
                "CONFIGURATION_ERROR",
            ),
            (
                StorageError::QueryFailed {
                    table: "t".to_string(),
                    message: "boom".to_string(),
                }
                .into(),
                "STORAGE_ERROR",
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.error_code(), code);
        }
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod response_tests {
    use super::*;

    #[test]
    fn test_to_response_includes_details() {
        let err = DecoratorError::from(ExpansionError::UnexpandedAssociationParent {
            child: "customer.company".to_string(),
            parent: "customer".to_string(),
        });
        let response = err.to_response();

        assert_eq!(response.code, "UNEXPANDED_ASSOCIATION_PARENT");
        assert_eq!(
            response.message,
            "The 'customer.company' association is expanded, but its parent 'customer' is not"
        );
        assert_eq!(
            response.details,
            Some(json!({"child": "customer.company", "parent": "customer"}))
        );
    }

    #[test]
    fn test_response_serialization_skips_empty_details() {
        let err = DecoratorError::from(StorageError::UnknownTable {
            table: "invoices".to_string(),
        });
        let value = serde_json::to_value(err.to_response()).unwrap();

        assert_eq!(
            value,
            json!({"code": "STORAGE_ERROR", "message": "Unknown table 'invoices'"})
        );
    }

    #[test]
    fn test_into_response_status() {
        let err = DecoratorError::from(ExpansionError::AssociationNotFound {
            property: "bogus".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Error Message Tests
// =============================================================================

mod message_tests {
    use super::*;

    #[test]
    fn test_no_adapter_lists_available_adapters() {
        let err = AdapterError::NoAdapter {
            model_type: "Invoice".to_string(),
            available: vec!["relational".to_string(), "plain".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No adapter found for 'Invoice'. The available adapters are: relational, plain"
        );
    }

    #[test]
    fn test_parse_error_mentions_file() {
        let with_file = ConfigurationError::ParseError {
            file: Some("decorators.yaml".to_string()),
            message: "bad indentation".to_string(),
        };
        let without_file = ConfigurationError::ParseError {
            file: None,
            message: "bad indentation".to_string(),
        };

        assert_eq!(
            with_file.to_string(),
            "Failed to parse decorator config 'decorators.yaml': bad indentation"
        );
        assert_eq!(
            without_file.to_string(),
            "Failed to parse decorator config: bad indentation"
        );
    }
}

// =============================================================================
// Error Propagation Tests
// =============================================================================

mod propagation_tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_accessor_failure_propagates_from_nested_render() {
        let customer = DecoratorType::builder("CustomerDecorator")
            .property("id")
            .association_method("company", |_| Err(anyhow::anyhow!("database is down")))
            .belongs_to(
                "company",
                ReflectionOptions::new().exec_context(ExecContext::Decorator),
            )
            .unwrap()
            .build()
            .unwrap();
        let invoice = DecoratorType::builder("InvoiceDecorator")
            .belongs_to(
                "customer",
                ReflectionOptions::new().expandable(true).decorator(customer),
            )
            .unwrap()
            .build()
            .unwrap();

        let model = Object::new("Invoice")
            .with_shared("customer", Arc::new(Object::new("Customer").with("id", 1i64)));

        let err = invoice
            .render(
                &model,
                &RenderOptions::new().with_expand(ExpandSet::parse("customer")),
            )
            .unwrap_err();

        match err {
            DecoratorError::Storage(StorageError::AccessorFailed {
                model_type,
                property,
                message,
            }) => {
                assert_eq!(model_type, "Customer");
                assert_eq!(property, "company");
                assert_eq!(message, "database is down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_question_mark_into_anyhow() {
        fn render() -> Result<Value> {
            let decorator = DecoratorType::builder("InvoiceDecorator").build()?;
            let json = decorator.to_json(
                &Object::new("Invoice"),
                &RenderOptions::new().with_expand(ExpandSet::parse("bogus")),
            )?;
            Ok(json)
        }

        let err = render().unwrap_err();
        assert!(err.downcast_ref::<DecoratorError>().is_some());
    }
}
