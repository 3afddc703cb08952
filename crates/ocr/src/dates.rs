//! Date token discovery and normalization.
//!
//! Date formats are a rule table: each entry has a regex, a priority and a
//! shape telling how to read its captures. New formats are new entries.
//! Discovery keeps the highest-priority non-overlapping matches; resolution
//! turns a token into a calendar date, inferring missing or two-digit years
//! from a [`YearContext`].

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tallyscan_core::period::{expand_two_digit_year, nearest_year};
use tallyscan_core::DateRange;

use crate::normalize::NormalizedLine;

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

// ── Format table ──────────────────────────────────────────────────────────────

/// How a format's captures map onto year/month/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `2025-03-04`, `2025/03/04`
    YearMonthDay,
    /// `03/04/2025`: month first, day first when the first part exceeds 12.
    MonthFirst,
    /// `04-03-2025`, `04.03.2025`: day first, month first when invalid.
    DayFirst,
    /// `Mar 4, 2025`, `MAR 04`
    MonthNameDay,
    /// `4 March 2025`, `04-MAR-25`, `04 MAR`
    DayMonthName,
    /// `03/04`: month first, no year.
    MonthDay,
}

struct DateFormat {
    name: &'static str,
    priority: u8,
    shape: DateShape,
    regex: fn() -> &'static Regex,
}

re!(re_iso, r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b");
re!(re_month_name_year, format!(r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"));
re!(re_day_month_name_year, format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?[\s\-]?({MONTHS})\.?,?[\s\-]?(\d{{4}}|\d{{2}})\b"));
re!(re_slash, r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b");
re!(re_dash, r"\b(\d{1,2})-(\d{1,2})-(\d{4}|\d{2})\b");
re!(re_dot, r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b");
re!(re_month_name, format!(r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})\b"));
re!(re_day_month_name, format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?[\s\-]?({MONTHS})\b"));
re!(re_month_day, r"\b(\d{1,2})/(\d{1,2})\b");

fn formats() -> &'static [DateFormat] {
    static FORMATS: [DateFormat; 9] = [
        DateFormat { name: "iso", priority: 100, shape: DateShape::YearMonthDay, regex: re_iso },
        DateFormat { name: "month_name_year", priority: 95, shape: DateShape::MonthNameDay, regex: re_month_name_year },
        DateFormat { name: "day_month_name_year", priority: 95, shape: DateShape::DayMonthName, regex: re_day_month_name_year },
        DateFormat { name: "slash", priority: 80, shape: DateShape::MonthFirst, regex: re_slash },
        DateFormat { name: "dash", priority: 75, shape: DateShape::DayFirst, regex: re_dash },
        DateFormat { name: "dot", priority: 70, shape: DateShape::DayFirst, regex: re_dot },
        DateFormat { name: "month_name", priority: 60, shape: DateShape::MonthNameDay, regex: re_month_name },
        DateFormat { name: "day_month_name", priority: 60, shape: DateShape::DayMonthName, regex: re_day_month_name },
        DateFormat { name: "month_day", priority: 50, shape: DateShape::MonthDay, regex: re_month_day },
    ];
    &FORMATS
}

// ── Tokens ────────────────────────────────────────────────────────────────────

/// Year as written in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearPart {
    Full(i32),
    TwoDigit(i32),
    Missing,
}

/// A date-looking span of a line, not yet checked against the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken {
    pub raw: String,
    pub format: &'static str,
    pub shape: DateShape,
    /// Layout columns, end exclusive.
    pub start: usize,
    pub end: usize,
    pub first: u32,
    pub second: u32,
    pub year: YearPart,
}

impl DateToken {
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Anchors used when the text leaves the year out or abbreviates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearContext {
    pub reference: NaiveDate,
    pub period: Option<DateRange>,
}

impl YearContext {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference, period: None }
    }

    pub fn with_period(mut self, period: Option<DateRange>) -> Self {
        self.period = period;
        self
    }
}

/// All date tokens on a line, left to right. Where formats overlap the
/// higher-priority (then longer) match wins.
pub fn find_dates(line: &NormalizedLine) -> Vec<DateToken> {
    find_in_text(&line.text)
        .into_iter()
        .map(|(bs, be, token)| DateToken { start: line.column_at(bs), end: line.column_at(be), ..token })
        .collect()
}

/// Date tokens in free text, with byte offsets as columns.
pub fn dates_in(text: &str) -> Vec<DateToken> {
    find_in_text(text).into_iter().map(|(_, _, token)| token).collect()
}

pub fn first_date_in(text: &str) -> Option<DateToken> {
    dates_in(text).into_iter().next()
}

fn find_in_text(text: &str) -> Vec<(usize, usize, DateToken)> {
    let mut candidates: Vec<(u8, usize, usize, DateToken)> = Vec::new();
    for format in formats() {
        for caps in (format.regex)().captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if runs_into_number(&text[whole.end()..]) {
                continue;
            }
            if let Some(token) = token_from_captures(format, &caps) {
                candidates.push((format.priority, whole.start(), whole.end(), token));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then((b.2 - b.1).cmp(&(a.2 - a.1))).then(a.1.cmp(&b.1)));

    let mut accepted: Vec<(usize, usize, DateToken)> = Vec::new();
    for (_, start, end, token) in candidates {
        if accepted.iter().all(|(s, e, _)| end <= *s || start >= *e) {
            accepted.push((start, end, DateToken { start, end, ..token }));
        }
    }
    accepted.sort_by_key(|(s, _, _)| *s);
    accepted
}

/// `15 JAN 25.00`: the trailing `25` belongs to an amount, not a year.
fn runs_into_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some('.' | ',')) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn token_from_captures(format: &DateFormat, caps: &Captures<'_>) -> Option<DateToken> {
    let raw = caps.get(0)?.as_str().to_string();
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let year = |i: usize| match caps.get(i) {
        None => Some(YearPart::Missing),
        Some(m) => {
            let y: i32 = m.as_str().parse().ok()?;
            Some(if m.as_str().len() == 4 { YearPart::Full(y) } else { YearPart::TwoDigit(y) })
        }
    };

    let (first, second, year) = match format.shape {
        DateShape::YearMonthDay => (num(2)?, num(3)?, year(1)?),
        DateShape::MonthFirst | DateShape::DayFirst => (num(1)?, num(2)?, year(3)?),
        DateShape::MonthNameDay => (month_number(caps.get(1)?.as_str())?, num(2)?, year(3)?),
        DateShape::DayMonthName => (num(1)?, month_number(caps.get(2)?.as_str())?, year(3)?),
        DateShape::MonthDay => (num(1)?, num(2)?, YearPart::Missing),
    };

    Some(DateToken {
        raw,
        format: format.name,
        shape: format.shape,
        start: 0,
        end: 0,
        first,
        second,
        year,
    })
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let n = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Calendar date for a token, or `None` when no reading is a valid date.
pub fn resolve(token: &DateToken, ctx: &YearContext) -> Option<NaiveDate> {
    // (month, day) readings in preference order.
    let readings: &[(u32, u32)] = match token.shape {
        DateShape::YearMonthDay | DateShape::MonthNameDay => &[(token.first, token.second)],
        DateShape::DayMonthName => &[(token.second, token.first)],
        DateShape::MonthFirst | DateShape::MonthDay => {
            &[(token.first, token.second), (token.second, token.first)]
        }
        DateShape::DayFirst => &[(token.second, token.first), (token.first, token.second)],
    };

    readings.iter().find_map(|&(month, day)| place(month, day, token.year, ctx))
}

fn place(month: u32, day: u32, year: YearPart, ctx: &YearContext) -> Option<NaiveDate> {
    match year {
        YearPart::Full(y) => NaiveDate::from_ymd_opt(y, month, day),
        YearPart::TwoDigit(yy) => NaiveDate::from_ymd_opt(expand_two_digit_year(yy, ctx.reference), month, day),
        YearPart::Missing => ctx
            .period
            .and_then(|p| p.place_month_day(month, day))
            .or_else(|| nearest_year(month, day, ctx.reference)),
    }
}

/// ISO `YYYY-MM-DD` form used in output records.
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ctx() -> YearContext {
        YearContext::new(date(2025, 3, 31))
    }

    fn line(text: &str) -> NormalizedLine {
        NormalizedLine { index: 0, indent: 0, text: text.to_string() }
    }

    fn one(text: &str) -> DateToken {
        let found = find_dates(&line(text));
        assert_eq!(found.len(), 1, "expected one date in {text:?}, got {found:?}");
        found.into_iter().next().unwrap()
    }

    fn resolved(text: &str) -> Option<NaiveDate> {
        resolve(&one(text), &ctx())
    }

    #[test]
    fn iso_and_ymd() {
        assert_eq!(resolved("2025-03-04"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("2025/3/4"), Some(date(2025, 3, 4)));
    }

    #[test]
    fn slash_is_month_first_with_day_first_fallback() {
        assert_eq!(resolved("03/04/2025"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("25/04/2025"), Some(date(2025, 4, 25)));
        assert_eq!(resolved("03/04/25"), Some(date(2025, 3, 4)));
    }

    #[test]
    fn dash_and_dot_are_day_first() {
        assert_eq!(resolved("04-03-2025"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("04.03.2025"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("12-25-2024"), Some(date(2024, 12, 25)));
    }

    #[test]
    fn month_names() {
        assert_eq!(resolved("Mar 4, 2025"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("4th March 2025"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("04-MAR-25"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("September 30 2024"), Some(date(2024, 9, 30)));
    }

    #[test]
    fn missing_year_uses_nearest_year_to_reference() {
        assert_eq!(resolved("03/04"), Some(date(2025, 3, 4)));
        assert_eq!(resolved("DEC 28"), Some(date(2024, 12, 28)));
        assert_eq!(resolved("15 JAN"), Some(date(2025, 1, 15)));
    }

    #[test]
    fn missing_year_prefers_statement_period() {
        let period = DateRange::new(date(2024, 12, 15), date(2025, 1, 14));
        let ctx = YearContext::new(date(2026, 6, 1)).with_period(Some(period));
        assert_eq!(resolve(&one("12/20"), &ctx), Some(date(2024, 12, 20)));
        assert_eq!(resolve(&one("01/03"), &ctx), Some(date(2025, 1, 3)));
    }

    #[test]
    fn two_digit_year_far_future_goes_back_a_century() {
        assert_eq!(resolved("03/04/99"), Some(date(1999, 3, 4)));
    }

    #[test]
    fn invalid_calendar_date_does_not_resolve() {
        assert_eq!(resolved("02/30/2025"), None);
        assert_eq!(resolved("13/13/2025"), None);
    }

    #[test]
    fn overlapping_formats_keep_the_most_specific() {
        let token = one("03/04/2025");
        assert_eq!(token.format, "slash");
        let token = one("Mar 4, 2025");
        assert_eq!(token.format, "month_name_year");
    }

    #[test]
    fn tokens_carry_layout_columns() {
        let l = NormalizedLine { index: 0, indent: 2, text: "03/04  03/05  COFFEE  4.50".to_string() };
        let found = find_dates(&l);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].end), (2, 7));
        assert_eq!((found[1].start, found[1].end), (9, 14));
    }

    #[test]
    fn amounts_are_not_dates() {
        assert!(find_dates(&line("1,234.56")).is_empty());
        assert!(find_dates(&line("4.50")).is_empty());
        assert!(first_date_in("Statement Period: 01/01/2024 to 01/31/2024").is_some());
    }

    #[test]
    fn year_digits_running_into_an_amount_are_not_a_year() {
        let found = find_dates(&line("15 JAN 25.00"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw, "15 JAN");
        assert_eq!(found[0].year, YearPart::Missing);
    }

    #[test]
    fn iso_output() {
        assert_eq!(to_iso(date(2025, 3, 4)), "2025-03-04");
    }
}
