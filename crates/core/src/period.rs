use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive date range, e.g. a statement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    /// Builds a range, swapping the bounds when they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            DateRange { start, end }
        } else {
            DateRange { start: end, end: start }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Places a year-less month/day inside the range. Statements that span
    /// a year boundary (Dec → Jan) resolve each side to its own year.
    pub fn place_month_day(self, month: u32, day: u32) -> Option<NaiveDate> {
        (self.start.year()..=self.end.year())
            .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
            .find(|d| self.contains(*d))
    }
}

/// Expands a two-digit year into the reference date's century. A result more
/// than 50 years ahead of the reference is moved back one century.
pub fn expand_two_digit_year(yy: i32, reference: NaiveDate) -> i32 {
    if yy >= 100 {
        return yy;
    }
    let century = reference.year().div_euclid(100) * 100;
    let candidate = century + yy;
    if candidate > reference.year() + 50 {
        candidate - 100
    } else {
        candidate
    }
}

/// Picks the year (reference year −1, 0 or +1) that puts `month/day`
/// closest to the reference date.
pub fn nearest_year(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    let y = reference.year();
    [y, y - 1, y + 1]
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .min_by_key(|d| (*d - reference).num_days().abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_contains() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert!(range.contains(date(2024, 6, 15)));
        assert!(range.contains(date(2024, 1, 1))); // inclusive start
        assert!(range.contains(date(2024, 12, 31))); // inclusive end
        assert!(!range.contains(date(2023, 12, 31)));
        assert!(!range.contains(date(2025, 1, 1)));
    }

    #[test]
    fn date_range_display() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(range.to_string(), "2024-01-01 to 2024-12-31");
    }

    #[test]
    fn date_range_normalizes_reversed_bounds() {
        let range = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 2, 1));
    }

    #[test]
    fn place_month_day_across_year_boundary() {
        let range = DateRange::new(date(2024, 12, 15), date(2025, 1, 14));
        assert_eq!(range.place_month_day(12, 20), Some(date(2024, 12, 20)));
        assert_eq!(range.place_month_day(1, 3), Some(date(2025, 1, 3)));
        assert_eq!(range.place_month_day(6, 1), None);
    }

    #[test]
    fn two_digit_year_stays_in_reference_century() {
        let reference = date(2026, 10, 17);
        assert_eq!(expand_two_digit_year(25, reference), 2025);
        assert_eq!(expand_two_digit_year(30, reference), 2030);
        assert_eq!(expand_two_digit_year(99, reference), 1999);
        assert_eq!(expand_two_digit_year(2024, reference), 2024);
    }

    #[test]
    fn nearest_year_prefers_closest_date() {
        let reference = date(2025, 1, 10);
        // December is closer in the previous year.
        assert_eq!(nearest_year(12, 28, reference), Some(date(2024, 12, 28)));
        assert_eq!(nearest_year(1, 5, reference), Some(date(2025, 1, 5)));
        assert_eq!(nearest_year(2, 30, reference), None);
    }

    #[test]
    fn nearest_year_handles_leap_day() {
        let reference = date(2025, 3, 1);
        assert_eq!(nearest_year(2, 29, reference), Some(date(2024, 2, 29)));
    }
}
