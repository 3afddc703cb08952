use serde::{Deserialize, Serialize};

/// Best-effort document facts. Every field is an empty string when not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementMetadata {
    pub bank_name: String,
    pub client_name: String,
    /// Human-readable period, e.g. `01/01/2024 to 01/31/2024`.
    pub statement_period: String,
    pub period_start: String,
    pub period_end: String,
    /// ISO 4217 code.
    pub currency: String,
    pub document_title: String,
    pub page_number: String,
    pub total_pages: String,
}

impl StatementMetadata {
    pub fn is_empty(&self) -> bool {
        *self == StatementMetadata::default()
    }
}
