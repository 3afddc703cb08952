//! Table template detection.
//!
//! Finds the column header row, derives column boundaries and roles from it,
//! and bounds the table body that follows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tallyscan_core::{ColumnRole, ParserConfig};

use crate::amounts::find_amounts;
use crate::dates::find_dates;
use crate::layout;
use crate::normalize::{blank_gap, NormalizedLine};
use crate::rules::{HeaderKeywords, LineRuleSet, RuleError};

/// Share of header cells that must hit a keyword. Keeps prose that happens
/// to mention "date" and "amount" from passing as a header.
const MIN_HEADER_COVERAGE: f32 = 0.6;

/// Why the table body stopped where it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableEnd {
    Footer { rule: String },
    BlankRun,
    EndOfDocument,
}

impl fmt::Display for TableEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEnd::Footer { rule } => write!(f, "footer ({rule})"),
            TableEnd::BlankRun => f.write_str("blank lines"),
            TableEnd::EndOfDocument => f.write_str("end of document"),
        }
    }
}

/// The detected table.
///
/// Line numbers are positions in the normalized line sequence, which has
/// blank lines removed. They are not raw line numbers of the input text;
/// `NormalizedLine::index` of the line at that position gives the raw one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRegion {
    pub header_line: usize,
    /// Always `header_line + 1`.
    pub start_line: usize,
    /// Exclusive.
    pub end_line: usize,
    /// Left edge (layout column) of each column. Interior edges sit midway
    /// between neighbouring header cells so right-aligned figures wider
    /// than their label still land in their own column.
    pub column_boundaries: Vec<usize>,
    pub column_roles: BTreeMap<usize, ColumnRole>,
    pub column_labels: Vec<String>,
    pub end_reason: TableEnd,
}

impl TableRegion {
    pub fn column_count(&self) -> usize {
        self.column_boundaries.len()
    }

    pub fn role(&self, column: usize) -> ColumnRole {
        self.column_roles.get(&column).copied().unwrap_or(ColumnRole::Other)
    }

    pub fn has_role(&self, role: ColumnRole) -> bool {
        self.column_roles.values().any(|r| *r == role)
    }

    pub fn first_column(&self, role: ColumnRole) -> Option<usize> {
        self.column_roles.iter().find(|(_, r)| **r == role).map(|(c, _)| *c)
    }

    /// `[start, end)` of a column; the last column is open-ended.
    pub fn column_span(&self, column: usize) -> (usize, usize) {
        let start = self.column_boundaries.get(column).copied().unwrap_or(0);
        let end = self.column_boundaries.get(column + 1).copied().unwrap_or(usize::MAX);
        (start, end)
    }

    /// Column sharing the most layout columns with `[start, end)`. Text left
    /// of the first boundary belongs to the first column.
    pub fn column_for(&self, start: usize, end: usize) -> usize {
        (0..self.column_count())
            .map(|c| {
                let (cs, ce) = self.column_span(c);
                (c, end.min(ce).saturating_sub(start.max(cs)))
            })
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .filter(|(_, overlap)| *overlap > 0)
            .map(|(c, _)| c)
            .unwrap_or(0)
    }

    pub fn body_len(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Column layout read from one header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumns {
    pub boundaries: Vec<usize>,
    pub roles: BTreeMap<usize, ColumnRole>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TemplateDetector {
    keywords: HeaderKeywords,
    footers: LineRuleSet,
    min_header_keywords: usize,
    max_header_tokens: usize,
    blank_run: usize,
}

impl TemplateDetector {
    pub fn new(config: &ParserConfig) -> Result<Self, RuleError> {
        Ok(Self {
            keywords: HeaderKeywords::new(&config.header_keywords),
            footers: LineRuleSet::new(&config.footer_rules)?,
            min_header_keywords: config.min_header_keywords,
            max_header_tokens: config.max_header_tokens,
            blank_run: config.table_end_blank_run,
        })
    }

    /// Reads a line as a column header, if it is one.
    pub fn header_columns(&self, line: &NormalizedLine) -> Option<HeaderColumns> {
        let cells = layout::cells(line);
        if cells.len() < 2 || cells.len() > self.max_header_tokens {
            return None;
        }
        if !find_dates(line).is_empty() || !find_amounts(line).is_empty() {
            return None;
        }

        let hits: Vec<_> = cells.iter().map(|c| self.keywords.classify(c.words.iter().map(|w| w.text))).collect();
        let hit_count = hits.iter().filter(|h| h.is_some()).count();
        if (hit_count as f32) < cells.len() as f32 * MIN_HEADER_COVERAGE {
            return None;
        }

        let mut roles = BTreeMap::new();
        let mut seen_date = false;
        for (column, hit) in hits.iter().enumerate() {
            let role = match hit.map(|h| h.role) {
                Some(ColumnRole::Date) if seen_date => ColumnRole::Other,
                Some(role) => role,
                None => ColumnRole::Other,
            };
            seen_date |= role == ColumnRole::Date;
            roles.insert(column, role);
        }

        let semantic = roles.values().filter(|r| **r != ColumnRole::Other).count();
        let has_money = roles
            .values()
            .any(|r| matches!(r, ColumnRole::Amount | ColumnRole::Debit | ColumnRole::Credit));
        if semantic < self.min_header_keywords || !seen_date || !has_money {
            return None;
        }

        let boundaries = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| if i == 0 { cell.start } else { (cells[i - 1].end + cell.start) / 2 })
            .collect();
        let labels = cells.iter().map(|c| c.text()).collect();
        Some(HeaderColumns { boundaries, roles, labels })
    }

    pub fn is_header(&self, line: &NormalizedLine) -> bool {
        self.header_columns(line).is_some()
    }

    /// The first header in the document and the body it governs.
    pub fn detect(&self, lines: &[NormalizedLine]) -> Option<TableRegion> {
        let (header_line, columns) = lines
            .iter()
            .enumerate()
            .find_map(|(i, line)| self.header_columns(line).map(|c| (i, c)))?;

        let start_line = header_line + 1;
        let (end_line, end_reason) = self.body_end(lines, start_line);

        Some(TableRegion {
            header_line,
            start_line,
            end_line,
            column_boundaries: columns.boundaries,
            column_roles: columns.roles,
            column_labels: columns.labels,
            end_reason,
        })
    }

    /// First terminator in scan order: a blank run (only once the body has
    /// started) or a footer line. Both are excluded from the body.
    fn body_end(&self, lines: &[NormalizedLine], start: usize) -> (usize, TableEnd) {
        for i in start..lines.len() {
            if i > start && blank_gap(&lines[i - 1], &lines[i]) >= self.blank_run {
                return (i, TableEnd::BlankRun);
            }
            if let Some(rule) = self.footers.find(&lines[i].collapsed()) {
                return (i, TableEnd::Footer { rule: rule.name.clone() });
            }
        }
        (lines.len(), TableEnd::EndOfDocument)
    }
}
