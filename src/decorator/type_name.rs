//! Machine-readable type names
//!
//! `Invoice` → `invoice`, `HTTPRequest` → `http_request`,
//! `Billing::Invoice` → `billing/invoice`.

use regex::Regex;
use std::sync::OnceLock;

/// Names rendered as collections
const LIST_TYPES: &[&str] = &["array", "vec", "list"];

/// Underscored type name of a model
pub fn infer(model_name: &str) -> String {
    static ACRONYM: OnceLock<Regex> = OnceLock::new();
    static WORD: OnceLock<Regex> = OnceLock::new();

    let acronym = ACRONYM.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
    let word = WORD.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").unwrap());

    let path = model_name.replace("::", "/");
    let path = acronym.replace_all(&path, "${1}_${2}");
    let underscored = word.replace_all(&path, "${1}_${2}").to_lowercase();

    if LIST_TYPES.contains(&underscored.as_str()) {
        "list".to_string()
    } else {
        underscored
    }
}
