//! Calendar month keys using a zero-based month index.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Three-letter month labels indexed by zero-based month.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Identifies one calendar month. `month` is zero-based (0 = January).
///
/// Ordering is chronological: keys compare by year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthKey")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawMonthKey {
    month: u32,
    year: i32,
}

impl TryFrom<RawMonthKey> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(raw: RawMonthKey) -> Result<Self, Self::Error> {
        MonthKey::new(raw.month, raw.year).ok_or(MonthKeyError::OutOfRange(raw.month))
    }
}

impl MonthKey {
    /// Builds a key from a zero-based month. Returns `None` when `month > 11`.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (month <= 11).then_some(Self { year, month })
    }

    /// Builds a key from a one-based calendar month (1 = January).
    pub fn from_calendar(month: u32, year: i32) -> Option<Self> {
        month.checked_sub(1).and_then(|zero| Self::new(zero, year))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Continuous month counter, useful for distance arithmetic.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + self.month as i64
    }

    pub fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32,
        }
    }

    /// The following month; December wraps to January of the next year.
    pub fn succ(&self) -> Self {
        if self.month == 11 {
            Self {
                year: self.year + 1,
                month: 0,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn shift(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }

    /// Number of months from `self` to `other`; negative when `other` is earlier.
    pub fn months_until(&self, other: &MonthKey) -> i64 {
        other.ordinal() - self.ordinal()
    }

    pub fn label(&self) -> &'static str {
        MONTH_LABELS[self.month as usize]
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.succ().first_day().map(|next| next - Duration::days(1))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthKeyError {
    OutOfRange(u32),
}

impl fmt::Display for MonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKeyError::OutOfRange(month) => {
                write!(f, "month index {month} is outside 0-11")
            }
        }
    }
}

impl std::error::Error for MonthKeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn december_wraps_to_january() {
        let dec = MonthKey::new(11, 2023).unwrap();
        assert_eq!(dec.succ(), MonthKey::new(0, 2024).unwrap());
    }

    #[test]
    fn ordering_is_chronological() {
        let late_2023 = MonthKey::new(11, 2023).unwrap();
        let early_2024 = MonthKey::new(0, 2024).unwrap();
        assert!(late_2023 < early_2024);
    }

    #[test]
    fn shift_handles_negative_offsets() {
        let jan = MonthKey::new(0, 2024).unwrap();
        assert_eq!(jan.shift(-1), MonthKey::new(11, 2023).unwrap());
        assert_eq!(jan.shift(14), MonthKey::new(2, 2025).unwrap());
    }

    #[test]
    fn last_day_respects_leap_years() {
        let feb = MonthKey::from_calendar(2, 2024).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn rejects_out_of_range_month_on_deserialize() {
        let result: Result<MonthKey, _> = serde_json::from_str(r#"{"month":12,"year":2024}"#);
        assert!(result.is_err());
    }
}
