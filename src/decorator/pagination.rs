//! Pagination metadata for collections

use serde::Serialize;
use serde_json::{Map, Value};

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Current page number (starts at 1)
    pub current_page: usize,

    /// Number of items per page
    pub per_page: usize,

    /// Total number of items
    pub total_entries: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Previous page number, if any
    pub previous_page: Option<usize>,

    /// Next page number, if any
    pub next_page: Option<usize>,
}

impl Page {
    /// Compute pagination metadata
    pub fn new(current_page: usize, per_page: usize, total_entries: usize) -> Self {
        let current_page = current_page.max(1);
        let per_page = per_page.max(1);
        let total_pages = total_entries.div_ceil(per_page);

        Self {
            current_page,
            per_page,
            total_entries,
            total_pages,
            previous_page: (current_page > 1).then(|| current_page - 1),
            next_page: (current_page < total_pages).then(|| current_page + 1),
        }
    }

    /// Offset of the first item of the page
    pub fn offset(&self) -> usize {
        self.current_page.saturating_sub(1) * self.per_page
    }

    /// Write the metadata at the root of a rendered collection
    pub fn merge_into(&self, output: &mut Map<String, Value>) {
        if let Ok(Value::Object(fields)) = serde_json::to_value(self) {
            output.extend(fields);
        }
    }
}
