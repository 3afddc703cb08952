//! Best-effort statement facts from the text around the table.

use chrono::NaiveDate;
use tallyscan_core::{DateRange, ParserConfig, StatementMetadata};
use tracing::debug;

use crate::amounts::{symbol_currency, ISO_CURRENCIES};
use crate::dates::{dates_in, first_date_in, resolve, to_iso, YearContext};
use crate::normalize::NormalizedLine;
use crate::template::TableRegion;

re!(re_period_label, r"(?i)\b(?:statement\s+period|for\s+the\s+period|period|dates|from)\b\s*:?\s*");
re!(re_period_split, r"(?i)^(.+?)\s+(?:to|through|thru|until|-|–)\s+(.+?)$");
re!(re_title, r"(?i)\b(?:statement|ledger|journal|report|activity)\b");
re!(
    re_bank,
    r"(?i)\b(?:bank|credit\s+union|building\s+society|bancorp|savings|american\s+express|amex|chase|citi(?:bank)?|capital\s+one|discover|barclays|hsbc|wells\s+fargo|santander)\b"
);
re!(
    re_client,
    r"(?i)\b(?:account\s+holder|account\s+name|customer(?:\s+name)?|client(?:\s+name)?|card\s*member|prepared\s+for|name)\s*:\s*(\S+(?: \S+)*)"
);
re!(re_currency_code, format!(r"\b({})\b", ISO_CURRENCIES.join("|")));
re!(re_page, r"(?i)\b(?:page|p\.)\s*(\d+)(?:\s*(?:of|/)\s*(\d+))?");

/// Lines considered for the all-caps bank name fallback.
const BANK_FALLBACK_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    scan_lines: usize,
    footer_lines: usize,
}

impl MetadataExtractor {
    pub fn new(config: &ParserConfig) -> Self {
        Self { scan_lines: config.metadata_scan_lines, footer_lines: config.footer_scan_lines }
    }

    /// `reference` anchors year-less period dates.
    pub fn extract(
        &self,
        lines: &[NormalizedLine],
        region: Option<&TableRegion>,
        reference: NaiveDate,
    ) -> StatementMetadata {
        let top_len = region.map_or(self.scan_lines, |r| r.header_line).min(lines.len());
        let top = &lines[..top_len];
        let bottom = &lines[lines.len().saturating_sub(self.footer_lines)..];
        let mut meta = StatementMetadata::default();

        if let Some((start, end)) = top.iter().find_map(|l| period_parts(&l.collapsed())) {
            meta.statement_period = format!("{start} to {end}");
            let end_date = first_date_in(&end).and_then(|t| resolve(&t, &YearContext::new(reference)));
            let start_anchor = end_date.unwrap_or(reference);
            let start_date = first_date_in(&start).and_then(|t| resolve(&t, &YearContext::new(start_anchor)));
            meta.period_start = start_date.map(to_iso).unwrap_or(start);
            meta.period_end = end_date.map(to_iso).unwrap_or(end);
        }

        let is_period_line = |l: &&NormalizedLine| period_parts(&l.collapsed()).is_some();

        if let Some(line) = top.iter().filter(|l| !is_period_line(l)).find(|l| re_title().is_match(&l.text)) {
            meta.document_title = line.collapsed();
        }

        meta.bank_name = top
            .iter()
            .filter(|l| !is_period_line(l) && !re_client().is_match(&l.text))
            .find(|l| re_bank().is_match(&l.text))
            .or_else(|| {
                top.iter()
                    .take(BANK_FALLBACK_LINES)
                    .filter(|l| !is_period_line(l) && l.collapsed() != meta.document_title)
                    .find(|l| is_all_caps(&l.text))
            })
            .map(|l| l.collapsed())
            .unwrap_or_default();

        if let Some(value) = top.iter().find_map(|l| client_value(&l.text)) {
            meta.client_name = value;
        }

        meta.currency = detect_currency(lines).unwrap_or_default();

        if let Some(caps) = bottom.iter().find_map(|l| re_page().captures(&l.text)) {
            meta.page_number = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            meta.total_pages = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        }

        debug!(?meta, "metadata");
        meta
    }
}

/// The statement period as a range, when both ends normalized to dates.
pub fn period_range(meta: &StatementMetadata) -> Option<DateRange> {
    let start = NaiveDate::parse_from_str(&meta.period_start, "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(&meta.period_end, "%Y-%m-%d").ok()?;
    Some(DateRange::new(start, end))
}

/// Raw `(from, to)` text of a period line.
fn period_parts(line: &str) -> Option<(String, String)> {
    let label = re_period_label().find(line)?;
    let rest = &line[label.end()..];
    let dates = dates_in(rest);
    if let [first, second, ..] = dates.as_slice() {
        return Some((first.raw.clone(), second.raw.clone()));
    }
    let caps = re_period_split().captures(rest)?;
    let from = caps.get(1)?.as_str().trim();
    let to = caps.get(2)?.as_str().trim();
    // Both sides must at least look like dates.
    if first_date_in(from).is_none() || first_date_in(to).is_none() {
        return None;
    }
    Some((from.to_string(), to.to_string()))
}

fn client_value(text: &str) -> Option<String> {
    let value = re_client().captures(text)?.get(1)?.as_str().trim();
    value.chars().any(char::is_alphabetic).then(|| value.to_string())
}

fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn detect_currency(lines: &[NormalizedLine]) -> Option<String> {
    if let Some(m) = lines.iter().find_map(|l| re_currency_code().find(&l.text)) {
        return Some(m.as_str().to_string());
    }
    lines
        .iter()
        .flat_map(|l| l.text.chars())
        .find_map(symbol_currency)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::template::TemplateDetector;
    use tallyscan_core::RawDocumentText;

    fn extract(text: &str) -> StatementMetadata {
        let config = ParserConfig::default();
        let lines = normalize(&RawDocumentText::new(text));
        let region = TemplateDetector::new(&config).unwrap().detect(&lines);
        let reference = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        MetadataExtractor::new(&config).extract(&lines, region.as_ref(), reference)
    }

    const STATEMENT: &str = "\
FIRST NATIONAL BANK
Checking Account Statement
Account Holder: JANE Q PUBLIC      Account: ****1234
Statement Period: 01/01/2024 to 01/31/2024

Date        Description                 Amount
01/03/2024  COFFEE                      -4.50 USD
01/04/2024  PAYROLL                  1,200.00

Page 1 of 2
";

    #[test]
    fn full_header_block() {
        let meta = extract(STATEMENT);
        assert_eq!(meta.bank_name, "FIRST NATIONAL BANK");
        assert_eq!(meta.document_title, "Checking Account Statement");
        assert_eq!(meta.client_name, "JANE Q PUBLIC");
        assert_eq!(meta.statement_period, "01/01/2024 to 01/31/2024");
        assert_eq!(meta.period_start, "2024-01-01");
        assert_eq!(meta.period_end, "2024-01-31");
        assert_eq!(meta.currency, "USD");
        assert_eq!(meta.page_number, "1");
        assert_eq!(meta.total_pages, "2");
    }

    #[test]
    fn period_range_from_metadata() {
        let meta = extract(STATEMENT);
        let range = period_range(&meta).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn month_name_period_without_start_year() {
        let meta = extract("ACME CARD SERVICES\nFor the period Dec 15 - Jan 14, 2025\n");
        assert_eq!(meta.period_start, "2024-12-15");
        assert_eq!(meta.period_end, "2025-01-14");
        assert_eq!(meta.bank_name, "ACME CARD SERVICES");
    }

    #[test]
    fn currency_symbol_fallback() {
        let meta = extract("Some Shop\nTotal spent £12.00\n");
        assert_eq!(meta.currency, "GBP");
    }

    #[test]
    fn nothing_found_is_empty() {
        assert!(extract("random unstructured paragraph with no dates or amounts").is_empty());
    }

    #[test]
    fn period_needs_dates() {
        assert!(period_parts("Transfer from savings to checking").is_none());
        assert_eq!(
            period_parts("Dates: 2025-03-01 through 2025-03-31"),
            Some(("2025-03-01".to_string(), "2025-03-31".to_string()))
        );
    }
}
