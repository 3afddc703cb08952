//! Rebuilds column-preserving text from positioned OCR words.
//!
//! Engines that report word boxes lose the spacing between columns when
//! asked for plain text. Placing each word at a layout column derived from
//! its left edge restores the geometry the template detector relies on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tallyscan_core::RawDocumentText;

/// One recognised word and its box, in image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// 0-100.
    pub confidence: f32,
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
}

/// Reads Tesseract TSV output (`level page_num block_num par_num line_num
/// word_num left top width height conf text`). Rows other than words and
/// malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.split('\t').collect();
            if cols.len() < 12 || cols[0] != "5" {
                return None;
            }
            let int = |i: usize| cols[i].trim().parse::<i32>().ok();
            let uint = |i: usize| cols[i].trim().parse::<u32>().ok();
            Some(OcrWord {
                block: uint(2)?,
                paragraph: uint(3)?,
                line: uint(4)?,
                left: int(6)?,
                top: int(7)?,
                width: int(8)?,
                height: int(9)?,
                confidence: cols[10].trim().parse().ok()?,
                text: cols[11..].join("\t"),
            })
        })
        .collect()
}

/// Lays words out as text lines. Words at or below `min_confidence` and
/// blank words are dropped. Lines follow reading order (top edge), words
/// within a line follow their left edge, and each word starts at the column
/// its left edge maps to, one space after the previous word at minimum.
pub fn reconstruct_lines(words: &[OcrWord], min_confidence: f32) -> RawDocumentText {
    let kept: Vec<&OcrWord> = words
        .iter()
        .filter(|w| w.confidence > min_confidence && !w.text.trim().is_empty())
        .collect();
    if kept.is_empty() {
        return RawDocumentText::new("");
    }

    let char_width = median_char_width(&kept);
    let min_left = kept.iter().map(|w| w.left).min().unwrap_or(0);

    let mut lines: BTreeMap<(u32, u32, u32), Vec<&OcrWord>> = BTreeMap::new();
    for word in kept {
        lines.entry((word.block, word.paragraph, word.line)).or_default().push(word);
    }
    let mut ordered: Vec<Vec<&OcrWord>> = lines.into_values().collect();
    ordered.sort_by_key(|line| line.iter().map(|w| w.top).min().unwrap_or(0));

    let text = ordered
        .into_iter()
        .map(|mut line| {
            line.sort_by_key(|w| w.left);
            let mut out = String::new();
            let mut len = 0usize;
            for word in line {
                let target = ((word.left - min_left) as f32 / char_width).round().max(0.0) as usize;
                let col = if len == 0 { target } else { target.max(len + 1) };
                out.extend(std::iter::repeat(' ').take(col - len));
                let text = word.text.trim();
                out.push_str(text);
                len = col + text.chars().count();
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n");

    RawDocumentText::new(text)
}

fn median_char_width(words: &[&OcrWord]) -> f32 {
    let mut widths: Vec<f32> = words
        .iter()
        .filter_map(|w| {
            let chars = w.text.trim().chars().count();
            (chars > 0 && w.width > 0).then(|| w.width as f32 / chars as f32)
        })
        .collect();
    if widths.is_empty() {
        return 1.0;
    }
    widths.sort_by(|a, b| a.total_cmp(b));
    widths[widths.len() / 2].max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, left: i32, top: i32, line: u32, confidence: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            left,
            top,
            width: 10 * text.chars().count() as i32,
            height: 12,
            confidence,
            block: 1,
            paragraph: 1,
            line,
        }
    }

    #[test]
    fn words_land_on_their_columns() {
        let words = vec![
            word("Amount", 400, 10, 1, 95.0),
            word("Date", 100, 10, 1, 95.0),
            word("Description", 220, 11, 1, 95.0),
            word("03/04/2025", 100, 30, 2, 90.0),
            word("COFFEE", 220, 30, 2, 90.0),
            word("-4.50", 410, 31, 2, 90.0),
        ];
        let text = reconstruct_lines(&words, 10.0);
        let lines: Vec<&str> = text.as_str().lines().collect();
        assert_eq!(lines[0], "Date        Description       Amount");
        assert_eq!(lines[1], "03/04/2025  COFFEE             -4.50");
    }

    #[test]
    fn low_confidence_and_blank_words_dropped() {
        let words = vec![
            word("KEEP", 0, 0, 1, 50.0),
            word("DROP", 60, 0, 1, 10.0),
            word("  ", 120, 0, 1, 99.0),
        ];
        assert_eq!(reconstruct_lines(&words, 10.0).as_str(), "KEEP");
    }

    #[test]
    fn overlapping_words_keep_a_space() {
        let words = vec![word("ABC", 0, 0, 1, 90.0), word("DEF", 15, 0, 1, 90.0)];
        assert_eq!(reconstruct_lines(&words, 10.0).as_str(), "ABC DEF");
    }

    #[test]
    fn lines_follow_vertical_order() {
        let mut second = word("SECOND", 0, 50, 1, 90.0);
        second.block = 0;
        let first = word("FIRST", 0, 10, 1, 90.0);
        let text = reconstruct_lines(&[second, first], 10.0);
        assert_eq!(text.as_str(), "FIRST\nSECOND");
    }

    #[test]
    fn empty_input() {
        assert!(reconstruct_lines(&[], 10.0).is_blank());
    }

    #[test]
    fn parses_tesseract_tsv() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t100\t10\t40\t12\t96.5\tDate\n\
                   5\t1\t1\t1\t1\t2\t220\t10\t110\t12\t91\tDescription\n";
        let words = parse_tsv(tsv);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Date");
        assert_eq!(words[0].confidence, 96.5);
        assert_eq!((words[1].left, words[1].width), (220, 110));
    }
}
