//! Generic in-memory model
//!
//! [`Object`] is a named bag of fields and associations. It stands in for
//! plain domain objects that are not backed by any store.

use crate::core::field::FieldValue;
use crate::core::model::{Identifier, Model};
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A plain object with dynamic fields
///
/// # Example
/// ```rust,ignore
/// let company = Object::new("Company").with("id", "company_id").with("name", "ACME");
/// let customer = Object::new("Customer")
///     .with("id", "customer_id")
///     .with_association("company", company);
/// ```
#[derive(Clone, Default)]
pub struct Object {
    name: String,
    fields: IndexMap<String, FieldValue>,
    associations: IndexMap<String, Option<Arc<dyn Model>>>,
}

impl Object {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a field
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set an association to a related object
    pub fn with_association(mut self, name: impl Into<String>, related: impl Model + 'static) -> Self {
        self.associations.insert(name.into(), Some(Arc::new(related)));
        self
    }

    /// Set an association to an already shared related object
    pub fn with_shared(mut self, name: impl Into<String>, related: Arc<dyn Model>) -> Self {
        self.associations.insert(name.into(), Some(related));
        self
    }

    /// Set an association to nothing
    pub fn without_association(mut self, name: impl Into<String>) -> Self {
        self.associations.insert(name.into(), None);
        self
    }

    /// Wrap into a shared model handle
    pub fn shared(self) -> Arc<dyn Model> {
        Arc::new(self)
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("associations", &self.associations.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Model for Object {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Option<Identifier> {
        FieldValue::non_null(self.fields.get("id").cloned())
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }

    fn association(&self, name: &str) -> Result<Option<Arc<dyn Model>>> {
        Ok(self.associations.get(name).cloned().flatten())
    }

    fn as_json(&self) -> Value {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        for (name, related) in &self.associations {
            let value = related.as_ref().map_or(Value::Null, |r| r.as_json());
            map.insert(name.clone(), value);
        }

        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_fields_and_id() {
        let obj = Object::new("Company").with("id", "c1").with("name", "ACME");

        assert_eq!(obj.model_name(), "Company");
        assert_eq!(obj.id(), Some(FieldValue::from("c1")));
        assert_eq!(obj.field("name"), Some(FieldValue::from("ACME")));
        assert_eq!(obj.field("missing"), None);
    }

    #[test]
    fn test_null_id_is_absent() {
        let obj = Object::new("Ghost").with("id", FieldValue::Null);
        assert_eq!(obj.id(), None);
    }

    #[test]
    fn test_association_lookup() {
        let obj = Object::new("Invoice")
            .with_association("customer", Object::new("Customer").with("id", "c1"))
            .without_association("payment");

        let customer = obj.association("customer").unwrap().expect("customer is set");
        assert_eq!(customer.id(), Some(FieldValue::from("c1")));
        assert!(obj.association("payment").unwrap().is_none());
        assert!(obj.association("unknown").unwrap().is_none());
    }

    #[test]
    fn test_as_json_nests_associations() {
        let obj = Object::new("Invoice")
            .with("id", 1i64)
            .with_association("customer", Object::new("Customer").with("id", "c1"))
            .without_association("payment");

        assert_eq!(
            obj.as_json(),
            json!({"id": 1, "customer": {"id": "c1"}, "payment": null})
        );
    }
}
