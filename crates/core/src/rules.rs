//! Rule tables for the heuristic stages of the parser.
//!
//! Each table is an ordered list of patterns with priorities; adding a rule
//! never requires touching the control flow that consumes it. The defaults
//! below are what ships; any table can be replaced from the config file.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentType;

/// Semantic role of a detected table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Description,
    Reference,
    Amount,
    Debit,
    Credit,
    Balance,
    Other,
}

impl ColumnRole {
    /// Columns whose values are money.
    pub fn is_monetary(self) -> bool {
        matches!(self, ColumnRole::Amount | ColumnRole::Debit | ColumnRole::Credit | ColumnRole::Balance)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::Date => "date",
            ColumnRole::Description => "description",
            ColumnRole::Reference => "reference",
            ColumnRole::Amount => "amount",
            ColumnRole::Debit => "debit",
            ColumnRole::Credit => "credit",
            ColumnRole::Balance => "balance",
            ColumnRole::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Contains,
    Prefix,
    Exact,
    Regex,
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "prefix" => Ok(MatchType::Prefix),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

/// A header label keyword. Matching is case-insensitive and allows partial
/// words in both directions (`Amt.` matches `amt`, `Desc` matches `description`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderKeyword {
    pub keyword: String,
    pub role: ColumnRole,
    pub priority: i32,
}

/// A line-level rule: footer markers that close the table, and noise markers
/// (page numbers, "continued") that are never transaction text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineRule {
    pub name: String,
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Debit,
    Credit,
}

/// A description hint that fixes the sign of an amount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignRule {
    pub name: String,
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub direction: Direction,
    /// Empty means every document type.
    #[serde(default)]
    pub document_types: Vec<DocumentType>,
}

impl SignRule {
    pub fn applies_to(&self, document_type: DocumentType) -> bool {
        self.document_types.is_empty() || self.document_types.contains(&document_type)
    }
}

fn keyword(keyword: &str, role: ColumnRole, priority: i32) -> HeaderKeyword {
    HeaderKeyword { keyword: keyword.to_string(), role, priority }
}

fn line_rule(name: &str, priority: i32, pattern: &str, match_type: MatchType) -> LineRule {
    LineRule { name: name.to_string(), priority, pattern: pattern.to_string(), match_type }
}

fn sign_rule(
    name: &str,
    priority: i32,
    pattern: &str,
    match_type: MatchType,
    direction: Direction,
    document_types: &[DocumentType],
) -> SignRule {
    SignRule {
        name: name.to_string(),
        priority,
        pattern: pattern.to_string(),
        match_type,
        direction,
        document_types: document_types.to_vec(),
    }
}

pub fn default_header_keywords() -> Vec<HeaderKeyword> {
    use ColumnRole::*;
    vec![
        keyword("date", Date, 100),
        keyword("debit", Debit, 90),
        keyword("withdrawal", Debit, 90),
        keyword("charge", Debit, 88),
        keyword("credit", Credit, 90),
        keyword("deposit", Credit, 90),
        keyword("payment", Credit, 85),
        keyword("balance", Balance, 90),
        keyword("amount", Amount, 85),
        keyword("amt", Amount, 85),
        keyword("reference", Reference, 80),
        keyword("cheque", Reference, 75),
        keyword("check", Reference, 75),
        keyword("num", Reference, 70),
        keyword("trans", Reference, 65),
        keyword("description", Description, 80),
        keyword("details", Description, 78),
        keyword("particulars", Description, 78),
        keyword("narrative", Description, 78),
        keyword("narration", Description, 78),
        keyword("transaction", Description, 66),
        keyword("merchant", Description, 60),
        keyword("payee", Description, 60),
        keyword("memo", Description, 60),
        keyword("name", Description, 55),
        keyword("type", Other, 50),
        keyword("account", Other, 50),
        keyword("category", Other, 50),
    ]
}

pub fn default_footer_rules() -> Vec<LineRule> {
    use MatchType::Regex;
    vec![
        line_rule("total", 100, r"(?i)^(?:grand\s+)?totals?\b", Regex),
        line_rule(
            "balance_forward",
            90,
            r"(?i)^balance\s+(?:forward|brought\s+forward|carried\s+forward)\b",
            Regex,
        ),
        line_rule("closing_balance", 80, r"(?i)^(?:closing|ending|new)\s+balance\b", Regex),
        line_rule("end_of_statement", 70, r"(?i)^end\s+of\s+(?:statement|transactions)\b", Regex),
    ]
}

pub fn default_noise_rules() -> Vec<LineRule> {
    use MatchType::Regex;
    vec![
        line_rule(
            "page_marker",
            100,
            r"(?i)^(?:page|p\.)\s*\d+(?:\s*(?:of|/)\s*\d+)?$",
            Regex,
        ),
        line_rule("continued", 90, r"(?i)^\(?continued\b|continued\s+on\s+next\s+page", Regex),
    ]
}

pub fn default_sign_rules() -> Vec<SignRule> {
    use Direction::{Credit, Debit};
    use DocumentType::{Bank, CreditCard, Ledger};
    use MatchType::{Contains, Regex};
    vec![
        // Card issuers: anything that is not a payment or refund is a charge.
        sign_rule("card_payment", 30, "payment", Contains, Credit, &[CreditCard]),
        sign_rule("card_thank_you", 30, "thank you", Contains, Credit, &[CreditCard]),
        sign_rule("card_refund", 30, r"(?i)\b(?:refund|return|reversal|cash\s*back)\b", Regex, Credit, &[CreditCard]),
        sign_rule("card_credit", 25, r"(?i)\bcredit\b", Regex, Credit, &[CreditCard]),
        // Accounts: unsigned amounts are credits unless the text says otherwise.
        sign_rule("deposit", 20, "deposit", Contains, Credit, &[Bank, Ledger]),
        sign_rule("payroll", 20, r"(?i)\b(?:payroll|salary|direct\s+dep)", Regex, Credit, &[Bank]),
        sign_rule("interest_paid", 20, "interest paid", Contains, Credit, &[Bank]),
        sign_rule("transfer_in", 20, "transfer from", Contains, Credit, &[Bank]),
        sign_rule("refund", 20, "refund", Contains, Credit, &[Bank]),
        sign_rule("payment_out", 15, "payment to", Contains, Debit, &[Bank]),
        sign_rule("transfer_out", 15, "transfer to", Contains, Debit, &[Bank]),
        sign_rule("withdrawal", 10, "withdrawal", Contains, Debit, &[Bank, Ledger]),
        sign_rule("atm", 10, r"(?i)\batm\b", Regex, Debit, &[Bank]),
        sign_rule("fee", 10, r"(?i)\b(?:fee|charge)s?\b", Regex, Debit, &[Bank]),
        sign_rule("card_purchase", 10, r"(?i)\b(?:purchase|pos|debit\s+card)\b", Regex, Debit, &[Bank]),
        sign_rule("check_paid", 10, r"(?i)^(?:check|cheque)\b", Regex, Debit, &[Bank, Ledger]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn match_type_from_str() {
        assert_eq!(MatchType::from_str("Regex").unwrap(), MatchType::Regex);
        assert_eq!(MatchType::from_str("prefix").unwrap(), MatchType::Prefix);
        assert!(MatchType::from_str("fuzzy").is_err());
    }

    #[test]
    fn default_header_table_covers_required_roles() {
        let table = default_header_keywords();
        for role in [
            ColumnRole::Date,
            ColumnRole::Description,
            ColumnRole::Reference,
            ColumnRole::Amount,
            ColumnRole::Debit,
            ColumnRole::Credit,
        ] {
            assert!(table.iter().any(|k| k.role == role), "no keyword for {role}");
        }
        assert!(table.iter().all(|k| k.keyword == k.keyword.to_lowercase()));
    }

    #[test]
    fn sign_rule_scope() {
        let rules = default_sign_rules();
        let card = rules.iter().find(|r| r.name == "card_payment").unwrap();
        assert!(card.applies_to(DocumentType::CreditCard));
        assert!(!card.applies_to(DocumentType::Bank));

        let unscoped = SignRule { document_types: vec![], ..card.clone() };
        assert!(unscoped.applies_to(DocumentType::Ledger));
    }

    #[test]
    fn monetary_roles() {
        assert!(ColumnRole::Balance.is_monetary());
        assert!(ColumnRole::Debit.is_monetary());
        assert!(!ColumnRole::Reference.is_monetary());
    }

    #[test]
    fn rules_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Tables {
            footer: Vec<LineRule>,
            sign: Vec<SignRule>,
        }
        let t: Tables = toml::from_str(
            r#"
            [[footer]]
            name = "subtotal"
            priority = 5
            pattern = "subtotal"

            [[sign]]
            name = "rent"
            priority = 40
            pattern = "rent"
            direction = "debit"
            document_types = ["bank"]
            "#,
        )
        .unwrap();
        assert_eq!(t.footer[0].match_type, MatchType::Contains);
        assert_eq!(t.sign[0].direction, Direction::Debit);
        assert_eq!(t.sign[0].document_types, vec![DocumentType::Bank]);
    }
}
