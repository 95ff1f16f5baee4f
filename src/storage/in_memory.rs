//! In-memory relational store for testing and development
//!
//! Tables hold rows of [`FieldValue`]s and know their associations, so the
//! records they return can be rendered by the relational adapter. Every
//! lookup is counted, which lets tests assert how many round trips a render
//! costs.

use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::model::{AssociationKind, AssociationMetadata, Connection, Identifier, Model, Record};
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

type Row = IndexMap<String, FieldValue>;

/// Schema of one table
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    model_name: String,
    primary_key: String,
    associations: IndexMap<String, AssociationMetadata>,
}

impl TableSchema {
    /// A table keyed by `id`
    pub fn new(name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            primary_key: "id".to_string(),
            associations: IndexMap::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Declare an association of the table's records
    pub fn association(mut self, name: impl Into<String>, metadata: AssociationMetadata) -> Self {
        self.associations.insert(name.into(), metadata);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct Table {
    schema: Arc<TableSchema>,
    rows: Vec<Row>,
}

/// Thread-safe in-memory store
///
/// Always handled through an `Arc`, since the records it returns keep a
/// handle on it to resolve their associations.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    queries: AtomicUsize,
    plucks: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tables: RwLock::new(HashMap::new()),
            queries: AtomicUsize::new(0),
            plucks: AtomicUsize::new(0),
        })
    }

    /// Create (or replace) a table
    pub fn define_table(&self, schema: TableSchema) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(lock_error)?;

        tracing::debug!(table = %schema.name, model = %schema.model_name, "Defining table");

        tables.insert(
            schema.name.clone(),
            Table {
                schema: Arc::new(schema),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append a row
    pub fn insert<I, K>(&self, table: &str, fields: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let mut tables = self.tables.write().map_err(lock_error)?;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;

        table
            .rows
            .push(fields.into_iter().map(|(k, v)| (k.into(), v)).collect());
        Ok(())
    }

    /// Find a record by primary key
    pub fn find(self: &Arc<Self>, table: &str, id: &Identifier) -> Result<Option<StoredRecord>, StorageError> {
        let primary_key = self.schema(table)?.primary_key.clone();
        self.find_by(table, &primary_key, id)
    }

    /// Find the first record whose `column` equals `value`
    pub fn find_by(
        self: &Arc<Self>,
        table: &str,
        column: &str,
        value: &FieldValue,
    ) -> Result<Option<StoredRecord>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(table, column, value = ?value, "SELECT *");

        let tables = self.tables.read().map_err(lock_error)?;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;

        Ok(table
            .rows
            .iter()
            .find(|row| row.get(column) == Some(value))
            .map(|row| StoredRecord::new(Arc::clone(self), Arc::clone(&table.schema), row.clone())))
    }

    /// Every record of a table, in insertion order
    pub fn all(self: &Arc<Self>, table: &str) -> Result<Vec<StoredRecord>, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(table, "SELECT * (all)");

        let tables = self.tables.read().map_err(lock_error)?;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;

        Ok(table
            .rows
            .iter()
            .map(|row| StoredRecord::new(Arc::clone(self), Arc::clone(&table.schema), row.clone()))
            .collect())
    }

    /// Find a record and preload the given associations
    pub fn load(
        self: &Arc<Self>,
        table: &str,
        id: &Identifier,
        preload: &[&str],
    ) -> Result<Option<StoredRecord>, StorageError> {
        let Some(mut record) = self.find(table, id)? else {
            return Ok(None);
        };

        for name in preload {
            record = record.preload(name)?;
        }
        Ok(Some(record))
    }

    /// Number of queries issued since the last reset
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of single-column projection queries since the last reset
    pub fn pluck_count(&self) -> usize {
        self.plucks.load(Ordering::SeqCst)
    }

    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
        self.plucks.store(0, Ordering::SeqCst);
    }

    fn schema(&self, table: &str) -> Result<Arc<TableSchema>, StorageError> {
        let tables = self.tables.read().map_err(lock_error)?;
        tables
            .get(table)
            .map(|t| Arc::clone(&t.schema))
            .ok_or_else(|| unknown_table(table))
    }

    fn resolve(
        self: &Arc<Self>,
        schema: &TableSchema,
        row: &Row,
        name: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        let Some(meta) = schema.associations.get(name) else {
            return Ok(None);
        };

        let (column, key) = match meta.kind {
            AssociationKind::BelongsTo => (&meta.related_primary_key, &meta.foreign_key),
            AssociationKind::HasOne => (&meta.foreign_key, &meta.owner_key),
        };

        match FieldValue::non_null(row.get(key).cloned()) {
            Some(value) => self.find_by(&meta.related_table, column, &value),
            None => Ok(None),
        }
    }
}

impl Connection for InMemoryStore {
    fn pluck_first(
        &self,
        table: &str,
        select: &str,
        filter_column: &str,
        value: &FieldValue,
    ) -> Result<Option<FieldValue>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.plucks.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(table, select, filter_column, value = ?value, "SELECT column");

        let tables = self.tables.read().map_err(lock_error)?;
        let table = tables.get(table).ok_or_else(|| unknown_table(table))?;

        Ok(table
            .rows
            .iter()
            .find(|row| row.get(filter_column) == Some(value))
            .and_then(|row| row.get(select).cloned()))
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self
            .tables
            .read()
            .map(|t| t.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();

        f.debug_struct("InMemoryStore")
            .field("tables", &tables)
            .field("queries", &self.query_count())
            .finish()
    }
}

fn lock_error<E: fmt::Display>(e: E) -> StorageError {
    StorageError::Unavailable {
        backend: "memory".to_string(),
        message: format!("Failed to acquire lock: {}", e),
    }
}

fn unknown_table(table: &str) -> StorageError {
    StorageError::UnknownTable {
        table: table.to_string(),
    }
}

/// A row loaded from an [`InMemoryStore`]
#[derive(Clone)]
pub struct StoredRecord {
    store: Arc<InMemoryStore>,
    schema: Arc<TableSchema>,
    row: Row,
    cache: IndexMap<String, Option<Arc<dyn Model>>>,
}

impl StoredRecord {
    fn new(store: Arc<InMemoryStore>, schema: Arc<TableSchema>, row: Row) -> Self {
        Self {
            store,
            schema,
            row,
            cache: IndexMap::new(),
        }
    }

    /// Load an association into the association cache
    pub fn preload(mut self, name: &str) -> Result<Self, StorageError> {
        let related = self
            .store
            .resolve(&self.schema, &self.row, name)?
            .map(|record| Arc::new(record) as Arc<dyn Model>);

        self.cache.insert(name.to_string(), related);
        Ok(self)
    }
}

impl fmt::Debug for StoredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredRecord")
            .field("table", &self.schema.name)
            .field("row", &self.row)
            .field("loaded", &self.cache.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Model for StoredRecord {
    fn model_name(&self) -> &str {
        &self.schema.model_name
    }

    fn id(&self) -> Option<Identifier> {
        FieldValue::non_null(self.row.get(&self.schema.primary_key).cloned())
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.row.get(name).cloned()
    }

    fn association(&self, name: &str) -> Result<Option<Arc<dyn Model>>> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }

        let related = self.store.resolve(&self.schema, &self.row, name)?;
        Ok(related.map(|record| Arc::new(record) as Arc<dyn Model>))
    }

    fn as_json(&self) -> Value {
        Value::Object(
            self.row
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<Map<_, _>>(),
        )
    }

    fn as_record(&self) -> Option<&dyn Record> {
        Some(self)
    }
}

impl Record for StoredRecord {
    fn table(&self) -> &str {
        &self.schema.name
    }

    fn primary_key(&self) -> &str {
        &self.schema.primary_key
    }

    fn read_attribute(&self, column: &str) -> Option<FieldValue> {
        self.row.get(column).cloned()
    }

    fn reflect_on_association(&self, name: &str) -> Option<&AssociationMetadata> {
        self.schema.associations.get(name)
    }

    fn association_loaded(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    fn connection(&self) -> &dyn Connection {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store
            .define_table(
                TableSchema::new("invoices", "Invoice")
                    .association("customer", AssociationMetadata::belongs_to("customer_id", "customers"))
                    .association("receipt", AssociationMetadata::has_one("invoice_id", "receipts")),
            )
            .unwrap();
        store
            .define_table(TableSchema::new("customers", "Customer"))
            .unwrap();
        store
            .define_table(TableSchema::new("receipts", "Receipt"))
            .unwrap();
        store
            .insert(
                "invoices",
                [("id", FieldValue::from(1i64)), ("customer_id", FieldValue::from(7i64))],
            )
            .unwrap();
        store
            .insert(
                "customers",
                [("id", FieldValue::from(7i64)), ("name", FieldValue::from("ACME"))],
            )
            .unwrap();
        store
            .insert(
                "receipts",
                [("id", FieldValue::from(99i64)), ("invoice_id", FieldValue::from(1i64))],
            )
            .unwrap();
        store.reset_query_count();
        store
    }

    #[test]
    fn test_find_counts_queries() {
        let store = store();
        let invoice = store.find("invoices", &FieldValue::from(1i64)).unwrap().unwrap();

        assert_eq!(invoice.model_name(), "Invoice");
        assert_eq!(invoice.id(), Some(FieldValue::from(1i64)));
        assert_eq!(store.query_count(), 1);
        assert!(store.find("invoices", &FieldValue::from(2i64)).unwrap().is_none());
        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_unknown_table() {
        let store = store();
        let err = store.find("nope", &FieldValue::from(1i64)).unwrap_err();
        assert!(matches!(err, StorageError::UnknownTable { ref table } if table == "nope"));
    }

    #[test]
    fn test_associations_resolve_lazily() {
        let store = store();
        let invoice = store.find("invoices", &FieldValue::from(1i64)).unwrap().unwrap();
        store.reset_query_count();

        let customer = invoice.association("customer").unwrap().unwrap();
        assert_eq!(customer.field("name"), Some(FieldValue::from("ACME")));
        let receipt = invoice.association("receipt").unwrap().unwrap();
        assert_eq!(receipt.id(), Some(FieldValue::from(99i64)));
        assert!(invoice.association("unknown").unwrap().is_none());

        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_load_with_preload() {
        let store = store();
        let invoice = store
            .load("invoices", &FieldValue::from(1i64), &["customer", "receipt"])
            .unwrap()
            .unwrap();
        assert!(invoice.association_loaded("customer"));
        assert!(invoice.association_loaded("receipt"));

        store.reset_query_count();
        invoice.association("customer").unwrap();
        invoice.association("receipt").unwrap();
        assert_eq!(store.query_count(), 0);
    }

    #[test]
    fn test_pluck_first() {
        let store = store();
        let pk = store
            .pluck_first("receipts", "id", "invoice_id", &FieldValue::from(1i64))
            .unwrap();

        assert_eq!(pk, Some(FieldValue::from(99i64)));
        assert_eq!(store.pluck_count(), 1);
        assert_eq!(store.query_count(), 1);
    }
}
