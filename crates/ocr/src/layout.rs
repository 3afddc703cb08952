//! Word and cell geometry of a normalized line.
//!
//! All positions are layout columns (`indent` + character offset), end
//! exclusive, so tokens from different lines can be compared against the
//! same column boundaries.

use crate::normalize::NormalizedLine;

/// A whitespace-delimited word and where it sits on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub byte_start: usize,
    pub byte_end: usize,
}

impl Word<'_> {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// A run of words separated by single spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<'a> {
    pub start: usize,
    pub end: usize,
    pub words: Vec<Word<'a>>,
}

impl Cell<'_> {
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.text).collect::<Vec<_>>().join(" ")
    }
}

pub fn words(line: &NormalizedLine) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (byte_start, col_start)
    let mut col = line.indent;

    for (byte, c) in line.text.char_indices() {
        if c.is_whitespace() {
            if let Some((bs, cs)) = current.take() {
                out.push(Word { text: &line.text[bs..byte], start: cs, end: col, byte_start: bs, byte_end: byte });
            }
        } else if current.is_none() {
            current = Some((byte, col));
        }
        col += 1;
    }
    if let Some((bs, cs)) = current {
        out.push(Word { text: &line.text[bs..], start: cs, end: col, byte_start: bs, byte_end: line.text.len() });
    }
    out
}

/// Groups words into cells split on runs of two or more spaces. When that
/// yields fewer than two cells (single-spaced OCR output), every word is its
/// own cell.
pub fn cells(line: &NormalizedLine) -> Vec<Cell<'_>> {
    let words = words(line);
    let mut grouped: Vec<Cell<'_>> = Vec::new();
    for word in &words {
        match grouped.last_mut() {
            Some(cell) if word.start - cell.end < 2 => {
                cell.end = word.end;
                cell.words.push(*word);
            }
            _ => grouped.push(Cell { start: word.start, end: word.end, words: vec![*word] }),
        }
    }
    if grouped.len() >= 2 {
        return grouped;
    }
    words
        .into_iter()
        .map(|w| Cell { start: w.start, end: w.end, words: vec![w] })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(indent: usize, text: &str) -> NormalizedLine {
        NormalizedLine { index: 0, indent, text: text.to_string() }
    }

    #[test]
    fn words_carry_columns() {
        let l = line(4, "Date  Desc  Amount");
        let w = words(&l);
        assert_eq!(w.len(), 3);
        assert_eq!((w[0].text, w[0].start, w[0].end), ("Date", 4, 8));
        assert_eq!((w[1].text, w[1].start), ("Desc", 10));
        assert_eq!((w[2].text, w[2].start, w[2].end), ("Amount", 16, 22));
        assert_eq!(&l.text[w[2].byte_start..w[2].byte_end], "Amount");
    }

    #[test]
    fn cells_split_on_wide_gaps() {
        let l = line(0, "Posting Date    Transaction Details    Amount");
        let c = cells(&l);
        let texts: Vec<_> = c.iter().map(Cell::text).collect();
        assert_eq!(texts, ["Posting Date", "Transaction Details", "Amount"]);
        assert_eq!(c[1].start, 16);
    }

    #[test]
    fn single_spaced_lines_fall_back_to_words() {
        let l = line(0, "Date Description Amount");
        let c = cells(&l);
        assert_eq!(c.len(), 3);
        assert_eq!(c[2].text(), "Amount");
    }

    #[test]
    fn overlap_is_half_open() {
        let l = line(0, "abc def");
        let w = words(&l);
        assert!(w[0].overlaps(2, 5));
        assert!(!w[0].overlaps(3, 5));
        assert!(w[1].overlaps(0, 5));
    }
}
