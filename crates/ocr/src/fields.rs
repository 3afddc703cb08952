//! Turns a validated row group into a [`ParsedTransaction`].

use tallyscan_core::{
    ColumnRole, Direction, DocumentType, Money, ParsedTransaction, ParserConfig, RowWarning, StatementMetadata,
};

use crate::amounts::AmountToken;
use crate::dates::{find_dates, resolve, to_iso, YearContext};
use crate::layout::{self, Word};
use crate::rules::{RuleError, SignRuleSet};
use crate::template::TableRegion;
use crate::validate::RowGroup;

#[derive(Debug, Clone)]
pub struct FieldParser {
    signs: SignRuleSet,
    reference_min_len: usize,
}

impl FieldParser {
    pub fn new(config: &ParserConfig) -> Result<Self, RuleError> {
        Ok(Self { signs: SignRuleSet::new(&config.sign_rules)?, reference_min_len: config.reference_min_len })
    }

    pub fn parse(
        &self,
        group: &RowGroup<'_>,
        region: &TableRegion,
        document_type: DocumentType,
        years: &YearContext,
        metadata: &StatementMetadata,
    ) -> ParsedTransaction {
        let mut tx = ParsedTransaction {
            bank_name: metadata.bank_name.clone(),
            client_name: metadata.client_name.clone(),
            ..Default::default()
        };

        tx.transaction_date = match resolve(&group.date, years) {
            Some(date) => to_iso(date),
            None => {
                tx.warn(RowWarning::UnparseableDate);
                group.date.raw.clone()
            }
        };

        // Words other than the row date and money. A date written inside
        // the description ("REFUND FOR 02/28") stays part of it.
        let words: Vec<(Word<'_>, ColumnRole)> = layout::words(group.line)
            .into_iter()
            .filter(|w| !group.date.overlaps(w.start, w.end))
            .filter(|w| !group.amounts.iter().any(|a| a.overlaps(w.start, w.end)))
            .map(|w| (w, region.role(region.column_for(w.start, w.end))))
            .collect();

        tx.reference_number = self.reference(&words, group, region);

        let described: Vec<&str> = words
            .iter()
            .filter(|(_, role)| *role == ColumnRole::Description || role.is_monetary())
            .map(|(w, _)| w.text)
            .collect();
        tx.description = if described.is_empty() {
            let line_dates = find_dates(group.line);
            words
                .iter()
                .filter(|(w, role)| {
                    *role != ColumnRole::Reference && !line_dates.iter().any(|d| d.overlaps(w.start, w.end))
                })
                .map(|(w, _)| w.text)
                .filter(|t| *t != tx.reference_number)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            described.join(" ")
        };
        for line in &group.continuations {
            tx.append_description(&line.collapsed());
        }

        let (amount, warning) = self.amount(group, region, document_type, &tx.description);
        tx.amount = amount;
        if let Some(warning) = warning {
            tx.warn(warning);
        }
        tx
    }

    fn reference(&self, words: &[(Word<'_>, ColumnRole)], group: &RowGroup<'_>, region: &TableRegion) -> String {
        if region.has_role(ColumnRole::Reference) {
            return words
                .iter()
                .filter(|(_, role)| *role == ColumnRole::Reference)
                .map(|(w, _)| w.text)
                .collect::<Vec<_>>()
                .join(" ");
        }
        let continuation_words = group.continuations.iter().flat_map(|l| layout::words(l));
        words
            .iter()
            .map(|(w, _)| *w)
            .chain(continuation_words)
            .find_map(|w| reference_run(w.text, self.reference_min_len))
            .unwrap_or_default()
    }

    /// Signed amount for the row, following the column, marker, document
    /// type precedence.
    fn amount(
        &self,
        group: &RowGroup<'_>,
        region: &TableRegion,
        document_type: DocumentType,
        description: &str,
    ) -> (Money, Option<RowWarning>) {
        let mut debit: Option<&AmountToken> = None;
        let mut credit: Option<&AmountToken> = None;
        let mut amount: Option<&AmountToken> = None;
        let mut stray: Option<&AmountToken> = None;
        for token in &group.amounts {
            let slot = match region.role(region.column_for(token.start, token.end)) {
                ColumnRole::Debit => &mut debit,
                ColumnRole::Credit => &mut credit,
                ColumnRole::Amount => &mut amount,
                ColumnRole::Balance => continue,
                _ => &mut stray,
            };
            slot.get_or_insert(token);
        }

        if debit.is_some() || credit.is_some() {
            let mut total = Money::zero();
            for (token, direction) in [(credit, Direction::Credit), (debit, Direction::Debit)] {
                let Some(token) = token else { continue };
                let Some(value) = token.value else {
                    return (Money::zero(), Some(RowWarning::UnparseableAmount));
                };
                total = match direction {
                    Direction::Credit => total + Money::from_decimal(value),
                    Direction::Debit => total - Money::from_decimal(value),
                };
            }
            return (total, None);
        }

        let Some(token) = amount.or(stray) else {
            return (Money::zero(), Some(RowWarning::MissingAmount));
        };
        let Some(magnitude) = token.value else {
            return (Money::zero(), Some(RowWarning::UnparseableAmount));
        };

        let direction = match token.marker {
            Some(marker) => marker,
            None => self.direction(token, document_type, description),
        };
        let magnitude = Money::from_decimal(magnitude);
        let signed = match direction {
            Direction::Debit => -magnitude,
            Direction::Credit => magnitude,
        };
        (signed, None)
    }

    fn direction(&self, token: &AmountToken, document_type: DocumentType, description: &str) -> Direction {
        let hinted = self.signs.direction(description, document_type);
        match document_type {
            // Card statements print charges unsigned; only payments and
            // refunds reduce the balance.
            DocumentType::CreditCard => hinted.unwrap_or(Direction::Debit),
            DocumentType::Bank | DocumentType::Ledger => {
                if token.explicit_sign {
                    if token.negative {
                        Direction::Debit
                    } else {
                        Direction::Credit
                    }
                } else {
                    hinted.unwrap_or(Direction::Credit)
                }
            }
        }
    }
}

/// First alphanumeric run of at least `min_len` characters that contains a
/// digit.
fn reference_run(word: &str, min_len: usize) -> Option<String> {
    word.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|run| run.len() >= min_len && run.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_string)
}
