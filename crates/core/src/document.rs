use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects the sign and column conventions applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Bank,
    CreditCard,
    Ledger,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [DocumentType::Bank, DocumentType::CreditCard, DocumentType::Ledger];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Bank => "bank",
            DocumentType::CreditCard => "creditcard",
            DocumentType::Ledger => "ledger",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "bank" | "bankstatement" => Ok(DocumentType::Bank),
            "creditcard" | "card" => Ok(DocumentType::CreditCard),
            "ledger" => Ok(DocumentType::Ledger),
            other => Err(format!("Unknown document type: '{other}'")),
        }
    }
}

/// Plain text produced by an OCR engine or a PDF text layer.
///
/// This is the only input type the parser accepts; whatever the producer
/// hands back is coerced into it at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RawDocumentText(String);

impl RawDocumentText {
    pub fn new(text: impl Into<String>) -> Self {
        RawDocumentText(strip_control(&text.into()))
    }

    /// Lossy UTF-8 decode of producer output.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        RawDocumentText(strip_control(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for RawDocumentText {
    fn from(s: &str) -> Self {
        RawDocumentText::new(s)
    }
}

impl From<String> for RawDocumentText {
    fn from(s: String) -> Self {
        RawDocumentText::new(s)
    }
}

impl AsRef<str> for RawDocumentText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Keeps line structure (\n, \r), tabs and form feeds; drops NUL and the rest.
fn strip_control(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t' | '\u{000c}'))
        .collect()
}
