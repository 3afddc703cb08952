use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;

/// Why a row was kept with reduced confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowWarning {
    /// Row had a date but no amount token; amount recorded as 0.
    MissingAmount,
    /// An amount token was found but could not be converted; amount recorded as 0.
    UnparseableAmount,
    /// The date token matched a pattern but is not a calendar date; kept verbatim.
    UnparseableDate,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowWarning::MissingAmount => write!(f, "missing amount"),
            RowWarning::UnparseableAmount => write!(f, "unparseable amount"),
            RowWarning::UnparseableDate => write!(f, "unparseable date"),
        }
    }
}

/// One structured transaction extracted from a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    /// `YYYY-MM-DD`, or the raw token when it could not be normalized.
    pub transaction_date: String,
    pub description: String,
    pub reference_number: String,
    pub amount: Money,
    pub bank_name: String,
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RowWarning>,
}

impl ParsedTransaction {
    /// The degraded record returned when no table could be detected.
    pub fn summary(description: impl Into<String>) -> Self {
        ParsedTransaction {
            transaction_date: String::new(),
            description: description.into(),
            reference_number: String::new(),
            amount: Money::zero(),
            bank_name: String::new(),
            client_name: String::new(),
            warnings: vec![],
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warn(&mut self, warning: RowWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Appends wrapped description text from a continuation line.
    pub fn append_description(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.description.is_empty() {
            self.description.push(' ');
        }
        self.description.push_str(text);
    }
}
