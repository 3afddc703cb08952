//! Monetary token discovery.
//!
//! A token is one word (`-1,234.56`, `(4.50)`, `$12`, `120.00CR`) optionally
//! joined with a detached currency symbol or code before it and a detached
//! `DR`/`CR` marker or currency code after it. Bare integers only count when a
//! symbol, code or thousands separator marks them as money.

use rust_decimal::Decimal;
use std::str::FromStr;
use tallyscan_core::Direction;

use crate::layout::{self, Word};
use crate::normalize::NormalizedLine;

/// ISO 4217 codes recognised next to amounts and in headers.
pub const ISO_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CAD", "AUD", "NZD", "CHF", "INR", "CNY", "HKD", "SGD", "ZAR", "SEK",
    "NOK", "DKK", "MXN", "BRL", "PHP", "AED",
];

/// ISO code for a currency symbol.
pub fn symbol_currency(symbol: char) -> Option<&'static str> {
    match symbol {
        '$' => Some("USD"),
        '€' => Some("EUR"),
        '£' => Some("GBP"),
        '¥' => Some("JPY"),
        '₹' => Some("INR"),
        _ => None,
    }
}

pub fn is_iso_currency(word: &str) -> bool {
    ISO_CURRENCIES.contains(&word)
}

re!(
    re_amount_word,
    r"^(\()?([-+])?([$€£¥₹])?([-+])?(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?|\.\d{2})(\))?(-)?((?i:cr|dr)\.?)?$"
);
re!(re_marker_word, r"^(?i:cr|dr)\.?$");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountToken {
    pub raw: String,
    /// Layout columns, end exclusive.
    pub start: usize,
    pub end: usize,
    /// Unsigned magnitude; `None` when the digits do not fit a decimal.
    pub value: Option<Decimal>,
    pub negative: bool,
    /// A `+`, `-` or parentheses was written.
    pub explicit_sign: bool,
    /// `DR` / `CR` suffix.
    pub marker: Option<Direction>,
    pub currency: Option<String>,
}

impl AmountToken {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// A single word read as an amount, before qualification.
struct WordAmount {
    value: Option<Decimal>,
    negative: bool,
    explicit_sign: bool,
    marker: Option<Direction>,
    symbol: Option<char>,
    has_cents: bool,
    has_thousands: bool,
}

fn parse_word(text: &str) -> Option<WordAmount> {
    let text = text.strip_suffix(',').unwrap_or(text);
    let caps = re_amount_word().captures(text)?;

    let open = caps.get(1).is_some();
    let close = caps.get(6).is_some();
    if open != close {
        return None;
    }
    let leading = caps.get(2).or(caps.get(4)).map(|m| m.as_str());
    if caps.get(2).is_some() && caps.get(4).is_some() {
        return None;
    }
    let trailing_minus = caps.get(7).is_some();
    if leading.is_some() && trailing_minus {
        return None;
    }

    let digits = caps.get(5)?.as_str();
    let has_thousands = digits.contains(',');
    let has_cents = digits.split_once('.').is_some_and(|(_, cents)| cents.len() == 2);
    let plain = digits.replace(',', "");
    let plain = if plain.starts_with('.') { format!("0{plain}") } else { plain };

    let marker = caps.get(8).map(|m| marker_direction(m.as_str()));
    let negative = open || trailing_minus || leading == Some("-");

    Some(WordAmount {
        value: Decimal::from_str(&plain).ok(),
        negative,
        explicit_sign: open || trailing_minus || leading.is_some(),
        marker,
        symbol: caps.get(3).and_then(|m| m.as_str().chars().next()),
        has_cents,
        has_thousands,
    })
}

fn marker_direction(marker: &str) -> Direction {
    if marker.to_ascii_lowercase().starts_with("cr") {
        Direction::Credit
    } else {
        Direction::Debit
    }
}

fn lone_symbol(word: &Word<'_>) -> Option<char> {
    let mut chars = word.text.chars();
    let c = chars.next()?;
    (chars.next().is_none() && symbol_currency(c).is_some()).then_some(c)
}

/// All monetary tokens on a line, left to right.
pub fn find_amounts(line: &NormalizedLine) -> Vec<AmountToken> {
    let words = layout::words(line);
    let mut out = Vec::new();
    let mut next_free = 0usize;
    let mut i = 0usize;

    while i < words.len() {
        let Some(parsed) = parse_word(words[i].text) else {
            i += 1;
            continue;
        };
        let mut first = i;
        let mut last = i;
        let mut currency = parsed.symbol.and_then(symbol_currency).map(str::to_string);
        let mut marker = parsed.marker;

        if i > next_free {
            let prev = &words[i - 1];
            if let (None, Some(sym)) = (parsed.symbol, lone_symbol(prev)) {
                currency = symbol_currency(sym).map(str::to_string);
                first = i - 1;
            } else if is_iso_currency(prev.text) {
                currency = Some(prev.text.to_string());
                first = i - 1;
            }
        }
        if let Some(next) = words.get(i + 1) {
            if marker.is_none() && re_marker_word().is_match(next.text) {
                marker = Some(marker_direction(next.text));
                last = i + 1;
            } else if currency.is_none() && is_iso_currency(next.text) {
                currency = Some(next.text.to_string());
                last = i + 1;
            }
        }

        let qualifies = parsed.has_cents || parsed.has_thousands || currency.is_some() || marker.is_some();
        if !qualifies {
            i += 1;
            continue;
        }

        let raw = line.text[words[first].byte_start..words[last].byte_end].to_string();
        out.push(AmountToken {
            raw,
            start: words[first].start,
            end: words[last].end,
            value: parsed.value,
            negative: parsed.negative,
            explicit_sign: parsed.explicit_sign,
            marker,
            currency,
        });
        next_free = last + 1;
        i = last + 1;
    }
    out
}
