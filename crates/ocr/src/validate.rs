//! Classifies table body lines and merges wrapped descriptions.

use tallyscan_core::{ColumnRole, ParserConfig};
use tracing::debug;

use crate::amounts::{find_amounts, AmountToken};
use crate::dates::{find_dates, DateToken};
use crate::normalize::NormalizedLine;
use crate::rules::{LineRuleSet, RuleError};
use crate::template::{TableRegion, TemplateDetector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseReason {
    Rule(String),
    RepeatedHeader,
    /// Text with no row to attach to.
    Orphan,
    /// Money but no date in the date column.
    AmountWithoutDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Row { date: DateToken, amounts: Vec<AmountToken> },
    Continuation,
    Noise(NoiseReason),
}

/// An accepted transaction line plus the wrapped lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup<'a> {
    pub line: &'a NormalizedLine,
    pub date: DateToken,
    /// Money tokens on the row, left to right, excluding anything that
    /// overlaps a date.
    pub amounts: Vec<AmountToken>,
    pub continuations: Vec<&'a NormalizedLine>,
}

#[derive(Debug, Clone)]
pub struct LineValidator {
    noise: LineRuleSet,
    tolerance: usize,
}

impl LineValidator {
    pub fn new(config: &ParserConfig) -> Result<Self, RuleError> {
        Ok(Self { noise: LineRuleSet::new(&config.noise_rules)?, tolerance: config.date_column_tolerance })
    }

    /// The date token sitting in (or near) the date column, if any.
    pub fn row_date(&self, line: &NormalizedLine, region: &TableRegion) -> Option<DateToken> {
        let column = region.first_column(ColumnRole::Date)?;
        let (start, end) = region.column_span(column);
        let lo = start.saturating_sub(self.tolerance);
        let hi = end.max(start.saturating_add(self.tolerance));
        find_dates(line).into_iter().find(|d| d.start >= lo && d.start < hi)
    }

    /// Classification of a single line, ignoring its neighbours. A line with
    /// neither date nor money comes back as `Continuation`; whether it really
    /// continues a row is decided by [`LineValidator::group`].
    pub fn classify(&self, line: &NormalizedLine, region: &TableRegion, detector: &TemplateDetector) -> LineClass {
        if let Some(rule) = self.noise.find(&line.collapsed()) {
            return LineClass::Noise(NoiseReason::Rule(rule.name.clone()));
        }
        if detector.is_header(line) {
            return LineClass::Noise(NoiseReason::RepeatedHeader);
        }

        let all_dates = find_dates(line);
        let amounts: Vec<AmountToken> = find_amounts(line)
            .into_iter()
            .filter(|a| !all_dates.iter().any(|d| d.overlaps(a.start, a.end)))
            .collect();

        match self.row_date(line, region) {
            Some(date) => LineClass::Row { date, amounts },
            None if amounts.is_empty() => LineClass::Continuation,
            None => LineClass::Noise(NoiseReason::AmountWithoutDate),
        }
    }

    /// Rows of the table body with their continuation lines attached.
    pub fn group<'a>(
        &self,
        lines: &'a [NormalizedLine],
        region: &TableRegion,
        detector: &TemplateDetector,
    ) -> Vec<RowGroup<'a>> {
        let body = &lines[region.start_line.min(lines.len())..region.end_line.min(lines.len())];
        let mut groups: Vec<RowGroup<'a>> = Vec::new();
        // Raw index of the last line that belongs to the open group.
        let mut open_until: Option<usize> = None;

        for line in body {
            match self.classify(line, region, detector) {
                LineClass::Row { date, amounts } => {
                    debug!(line = line.index, date = %date.raw, amounts = amounts.len(), "row");
                    groups.push(RowGroup { line, date, amounts, continuations: Vec::new() });
                    open_until = Some(line.index);
                }
                LineClass::Continuation => match (open_until, groups.last_mut()) {
                    (Some(last), Some(group)) if line.index == last + 1 => {
                        debug!(line = line.index, "continuation");
                        group.continuations.push(line);
                        open_until = Some(line.index);
                    }
                    _ => {
                        debug!(line = line.index, reason = ?NoiseReason::Orphan, "noise");
                        open_until = None;
                    }
                },
                LineClass::Noise(reason) => {
                    debug!(line = line.index, ?reason, "noise");
                    open_until = None;
                }
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use tallyscan_core::RawDocumentText;

    struct Fixture {
        lines: Vec<NormalizedLine>,
        region: TableRegion,
        detector: TemplateDetector,
        validator: LineValidator,
    }

    fn fixture(text: &str) -> Fixture {
        let config = ParserConfig::default();
        let lines = normalize(&RawDocumentText::new(text));
        let detector = TemplateDetector::new(&config).unwrap();
        let region = detector.detect(&lines).unwrap();
        Fixture { lines, region, detector, validator: LineValidator::new(&config).unwrap() }
    }

    const HEADER: &str = "Date        Description                 Amount\n";

    #[test]
    fn rows_and_wrapped_description() {
        let f = fixture(&format!(
            "{HEADER}03/04/2025  AMAZON MARKETPLACE          -25.00\n            ORDER 112-334 SEATTLE WA\n03/05/2025  COFFEE                       -4.50\n"
        ));
        let groups = f.validator.group(&f.lines, &f.region, &f.detector);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].continuations.len(), 1);
        assert_eq!(groups[0].continuations[0].text, "ORDER 112-334 SEATTLE WA");
        assert!(groups[1].continuations.is_empty());
    }

    #[test]
    fn continuation_after_blank_line_is_noise() {
        let f = fixture(&format!("{HEADER}03/04/2025  COFFEE   -4.50\n\nSOME NOTE\n03/05/2025  TEA   -2.00\n"));
        let groups = f.validator.group(&f.lines, &f.region, &f.detector);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].continuations.is_empty());
    }

    #[test]
    fn noise_lines_are_classified() {
        let f = fixture(HEADER);
        let class = |t: &str| {
            let l = NormalizedLine { index: 9, indent: 0, text: t.to_string() };
            f.validator.classify(&l, &f.region, &f.detector)
        };
        assert_eq!(class("Page 2 of 3"), LineClass::Noise(NoiseReason::Rule("page_marker".into())));
        assert_eq!(class("Date   Description   Amount"), LineClass::Noise(NoiseReason::RepeatedHeader));
        assert_eq!(class("                    1,234.00"), LineClass::Noise(NoiseReason::AmountWithoutDate));
        assert_eq!(class("JUST TEXT"), LineClass::Continuation);
    }

    #[test]
    fn date_only_line_is_a_row_without_amounts() {
        let f = fixture(&format!("{HEADER}03/04/2025  PENDING ITEM\n"));
        let groups = f.validator.group(&f.lines, &f.region, &f.detector);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].amounts.is_empty());
    }

    #[test]
    fn dates_far_from_the_date_column_do_not_make_rows() {
        let f = fixture(&format!("{HEADER}03/04/2025  REFUND   12.00\n                REF 02/28/2025\n"));
        let groups = f.validator.group(&f.lines, &f.region, &f.detector);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].continuations.len(), 1);
    }

    #[test]
    fn amounts_inside_dates_are_ignored() {
        let f = fixture(HEADER);
        let l = NormalizedLine { index: 9, indent: 0, text: "04.03.2025  BAKERY  3.20".to_string() };
        match f.validator.classify(&l, &f.region, &f.detector) {
            LineClass::Row { amounts, .. } => {
                assert_eq!(amounts.len(), 1);
                assert_eq!(amounts[0].raw, "3.20");
            }
            other => panic!("expected row, got {other:?}"),
        }
    }
}
