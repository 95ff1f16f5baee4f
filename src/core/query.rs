//! Query parameters for expansion and pagination

use crate::decorator::association::expansion::ExpandSet;
use serde::Deserialize;

/// Query parameters accepted by decorated endpoints
///
/// # Example
/// ```rust,ignore
/// // In handler:
/// pub async fn show_invoice(
///     Query(params): Query<QueryParams>,
/// ) -> Result<Json<Value>, DecoratorError> {
///     let options = RenderOptions::new().with_expand(params.expand_set());
///     Ok(Json(INVOICE.to_json(&invoice, &options)?))
/// }
///
/// // Usage:
/// GET /invoices/1?expand=customer,customer.company
/// GET /invoices?page=2&per_page=10&expand=customer
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    /// Comma separated expand paths
    pub expand: Option<String>,

    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            expand: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get items per page, ensuring it stays within 1..=100
    pub fn per_page(&self) -> usize {
        self.per_page.clamp(1, 100)
    }

    /// Parse the `expand` parameter
    pub fn expand_set(&self) -> ExpandSet {
        self.expand
            .as_deref()
            .map(ExpandSet::parse)
            .unwrap_or_default()
    }
}
