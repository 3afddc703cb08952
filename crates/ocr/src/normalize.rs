use serde::{Deserialize, Serialize};
use tallyscan_core::RawDocumentText;

const TAB_STOP: usize = 8;

/// A cleaned, non-empty physical line.
///
/// `index` is the 0-based position of the line in the raw text, so gaps
/// between consecutive indices are the blank lines that were dropped.
/// `indent + <char offset in text>` is the layout column of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub index: usize,
    pub indent: usize,
    pub text: String,
}

impl NormalizedLine {
    /// Whitespace-collapsed text, for free-text fields and rule matching.
    pub fn collapsed(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Layout column of a byte offset into `text`.
    pub fn column_at(&self, byte: usize) -> usize {
        let byte = byte.min(self.text.len());
        self.indent + self.text[..byte].chars().count()
    }

    /// Layout column one past the last character.
    pub fn end_column(&self) -> usize {
        self.indent + self.text.chars().count()
    }
}

/// Number of blank physical lines between two normalized lines.
pub fn blank_gap(prev: &NormalizedLine, next: &NormalizedLine) -> usize {
    next.index.saturating_sub(prev.index + 1)
}

/// Splits raw text into trimmed, non-empty lines.
///
/// Form feeds count as line breaks, tabs expand to the next tab stop, and
/// every other whitespace character becomes a plain space so that column
/// layout survives. Runs of spaces inside a line are kept.
pub fn normalize(raw: &RawDocumentText) -> Vec<NormalizedLine> {
    let unified = raw
        .as_str()
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000c}'], "\n");

    unified
        .split('\n')
        .enumerate()
        .filter_map(|(index, line)| clean_line(index, line))
        .collect()
}

fn clean_line(index: usize, line: &str) -> Option<NormalizedLine> {
    let mut expanded = String::with_capacity(line.len());
    let mut col = 0usize;
    for c in line.chars() {
        if c == '\t' {
            let next_stop = (col / TAB_STOP + 1) * TAB_STOP;
            expanded.extend(std::iter::repeat(' ').take(next_stop - col));
            col = next_stop;
        } else if c.is_whitespace() {
            expanded.push(' ');
            col += 1;
        } else if !c.is_control() {
            expanded.push(c);
            col += 1;
        }
    }

    let text = expanded.trim();
    if text.is_empty() {
        return None;
    }
    let indent = expanded.len() - expanded.trim_start().len();
    Some(NormalizedLine { index, indent, text: text.to_string() })
}
