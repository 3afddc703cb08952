//! The statement pipeline: normalize, detect the table, validate and merge
//! rows, parse fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tallyscan_core::{DocumentType, ParsedTransaction, ParserConfig, RawDocumentText, StatementMetadata};
use tracing::{debug, info};

use crate::dates::YearContext;
use crate::hash::sha256_bytes;
use crate::fields::FieldParser;
use crate::metadata::{period_range, MetadataExtractor};
use crate::normalize::{normalize, NormalizedLine};
use crate::rules::RuleError;
use crate::template::{TableRegion, TemplateDetector};
use crate::validate::LineValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// A header was found and rows were read from the table body.
    Table,
    /// No header; the whole text became one summary record.
    Fallback,
}

/// Document-level condition reported alongside the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseNotice {
    NoTransactionsFound,
}

impl ParseNotice {
    pub fn code(self) -> &'static str {
        match self {
            ParseNotice::NoTransactionsFound => "NO_TRANSACTIONS_FOUND",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ParseNotice::NoTransactionsFound => "No transactions were found in the document",
        }
    }
}

impl fmt::Display for ParseNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    pub document_type: DocumentType,
    pub mode: ParseMode,
    pub region: Option<TableRegion>,
    pub transactions: Vec<ParsedTransaction>,
    pub metadata: StatementMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<ParseNotice>,
}

/// What the template detector saw, for inspection without parsing rows.
#[derive(Debug, Clone)]
pub struct Detection {
    pub lines: Vec<NormalizedLine>,
    pub region: Option<TableRegion>,
}

impl Detection {
    pub fn header(&self) -> Option<&NormalizedLine> {
        self.region.as_ref().and_then(|r| self.lines.get(r.header_line))
    }
}

/// Holds the compiled rule tables. Stateless between documents, so one
/// parser can serve any number of threads.
#[derive(Debug, Clone)]
pub struct StatementParser {
    config: ParserConfig,
    config_digest: [u8; 32],
    detector: TemplateDetector,
    validator: LineValidator,
    fields: FieldParser,
    metadata: MetadataExtractor,
}

impl StatementParser {
    pub fn new(config: ParserConfig) -> Result<Self, RuleError> {
        Ok(Self {
            detector: TemplateDetector::new(&config)?,
            validator: LineValidator::new(&config)?,
            fields: FieldParser::new(&config)?,
            metadata: MetadataExtractor::new(&config),
            config_digest: sha256_bytes(&serde_json::to_vec(&config)?),
            config,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// SHA-256 of the serialized configuration. Two parsers with equal
    /// digests produce the same outcome for the same text and day.
    pub fn config_digest(&self) -> &[u8; 32] {
        &self.config_digest
    }

    pub fn detect(&self, text: &RawDocumentText) -> Detection {
        let lines = normalize(text);
        let region = self.detector.detect(&lines);
        Detection { lines, region }
    }

    /// Parses with the configured reference date, or today when none is set.
    pub fn parse(&self, text: &RawDocumentText, document_type: DocumentType) -> ParseOutcome {
        let today = chrono::Local::now().date_naive();
        self.parse_at(text, document_type, today)
    }

    /// Parses with `today` as the last-resort anchor for inferred years.
    pub fn parse_at(&self, text: &RawDocumentText, document_type: DocumentType, today: NaiveDate) -> ParseOutcome {
        let Detection { lines, region } = self.detect(text);
        let anchor = self.config.reference_date.unwrap_or(today);
        let metadata = self.metadata.extract(&lines, region.as_ref(), anchor);

        let (mode, transactions) = match &region {
            Some(region) => {
                let period = period_range(&metadata);
                let reference = self.config.reference_date.or(period.map(|p| p.end)).unwrap_or(today);
                let years = YearContext::new(reference).with_period(period);
                debug!(
                    header = region.header_line,
                    body = ?(region.start_line..region.end_line),
                    end = ?region.end_reason,
                    %reference,
                    "table detected"
                );
                let transactions = self
                    .validator
                    .group(&lines, region, &self.detector)
                    .iter()
                    .map(|group| self.fields.parse(group, region, document_type, &years, &metadata))
                    .collect();
                (ParseMode::Table, transactions)
            }
            None => {
                debug!(lines = lines.len(), "no table detected, using summary record");
                let transactions = if lines.is_empty() {
                    Vec::new()
                } else {
                    let mut summary = ParsedTransaction::summary(text.as_str().trim());
                    summary.bank_name = metadata.bank_name.clone();
                    summary.client_name = metadata.client_name.clone();
                    vec![summary]
                };
                (ParseMode::Fallback, transactions)
            }
        };

        let notice = transactions.is_empty().then_some(ParseNotice::NoTransactionsFound);
        info!(
            document_type = %document_type,
            mode = ?mode,
            transactions = transactions.len(),
            low_confidence = transactions.iter().filter(|t| t.is_low_confidence()).count(),
            "statement parsed"
        );

        ParseOutcome { document_type, mode, region, transactions, metadata, notice }
    }
}
