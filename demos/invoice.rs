//! Invoice rendering demo
//!
//! Renders the same invoice with several expand requests, backed by the
//! in-memory relational store, and prints how many queries each render cost.
//!
//! ```sh
//! RUST_LOG=decorator=debug cargo run --example invoice
//! ```

use anyhow::Result;
use decorator::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DECORATORS: &str = r#"
decorators:
  - name: CompanyDecorator
    include_type: true
    properties: [id, name]

  - name: CustomerDecorator
    include_type: true
    properties: [id, full_name, email]
    associations:
      - name: company
        kind: belongs_to
        expandable: true
        decorator: CompanyDecorator

  - name: ReceiptDecorator
    properties: [number]
    timestamps: [paid_at]

  - name: InvoiceDecorator
    include_type: true
    properties: [id, total]
    timestamps: [issued_at]
    associations:
      - name: customer
        kind: belongs_to
        expandable: true
        decorator: CustomerDecorator
      - name: receipt
        kind: has_one
        expandable: true
        render_nil: true
        decorator: ReceiptDecorator
"#;

fn seed() -> Result<Arc<InMemoryStore>> {
    let store = InMemoryStore::new();

    store.define_table(TableSchema::new("companies", "Company"))?;
    store.define_table(
        TableSchema::new("customers", "Customer").association(
            "company",
            AssociationMetadata::belongs_to("company_id", "companies"),
        ),
    )?;
    store.define_table(
        TableSchema::new("invoices", "Invoice")
            .association(
                "customer",
                AssociationMetadata::belongs_to("customer_id", "customers"),
            )
            .association(
                "receipt",
                AssociationMetadata::has_one("invoice_id", "receipts").related_primary_key("number"),
            ),
    )?;
    store.define_table(TableSchema::new("receipts", "Receipt").primary_key("number"))?;

    let now = chrono::Utc::now();

    store.insert(
        "companies",
        [("id", FieldValue::from(1i64)), ("name", FieldValue::from("ACME"))],
    )?;
    store.insert(
        "customers",
        [
            ("id", FieldValue::from(10i64)),
            ("full_name", FieldValue::from("John Doe")),
            ("email", FieldValue::from("john@acme.test")),
            ("company_id", FieldValue::from(1i64)),
        ],
    )?;
    store.insert(
        "invoices",
        [
            ("id", FieldValue::from(100i64)),
            ("total", FieldValue::from(249.9)),
            ("issued_at", FieldValue::from(now)),
            ("customer_id", FieldValue::from(10i64)),
        ],
    )?;
    store.insert(
        "receipts",
        [
            ("number", FieldValue::from("R-2024-001")),
            ("paid_at", FieldValue::from(now)),
            ("invoice_id", FieldValue::from(100i64)),
        ],
    )?;

    Ok(store)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store = seed()?;
    let catalog = DecoratorCatalog::from_config(DecoratorsConfig::from_yaml_str(DECORATORS)?)?;
    tracing::info!(decorators = ?catalog.names(), "Decorators loaded");

    let invoice = store
        .find("invoices", &FieldValue::from(100i64))?
        .ok_or_else(|| anyhow::anyhow!("invoice 100 is missing"))?;

    for expand in ["", "customer", "customer,customer.company,receipt", "customer.company"] {
        store.reset_query_count();

        let params = QueryParams {
            expand: Some(expand.to_string()),
            ..Default::default()
        };
        let options = RenderOptions::new().with_expand(params.expand_set());

        println!("\n?expand={expand}");
        match catalog.render("InvoiceDecorator", &invoice, &options) {
            Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
            Err(e) => println!(
                "{} {}",
                e.status_code(),
                serde_json::to_string(&e.to_response())?
            ),
        }
        println!("queries: {}", store.query_count());
    }

    let invoices: Vec<Arc<dyn Model>> = store
        .all("invoices")?
        .into_iter()
        .map(|record| Arc::new(record) as Arc<dyn Model>)
        .collect();
    let collection = CollectionDecorator::decorate_with(
        catalog
            .get("InvoiceDecorator")
            .ok_or_else(|| anyhow::anyhow!("InvoiceDecorator is not configured"))?,
    );
    let page = Page::new(1, 20, invoices.len());

    println!("\ncollection");
    println!(
        "{}",
        serde_json::to_string_pretty(&collection.render_page(&invoices, &page, &RenderOptions::new())?)?
    );

    Ok(())
}
