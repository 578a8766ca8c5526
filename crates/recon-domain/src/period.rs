//! Resolved statement periods.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

/// An inclusive month range resolved from a statement-period string.
///
/// Months are zero-based. The start never lies after the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod", into = "RawPeriod")]
pub struct ParsedPeriod {
    start: MonthKey,
    end: MonthKey,
}

#[derive(Clone, Serialize, Deserialize)]
struct RawPeriod {
    start_month: u32,
    start_year: i32,
    end_month: u32,
    end_year: i32,
}

impl TryFrom<RawPeriod> for ParsedPeriod {
    type Error = PeriodError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        ParsedPeriod::new(raw.start_month, raw.start_year, raw.end_month, raw.end_year)
    }
}

impl From<ParsedPeriod> for RawPeriod {
    fn from(period: ParsedPeriod) -> Self {
        Self {
            start_month: period.start.month(),
            start_year: period.start.year(),
            end_month: period.end.month(),
            end_year: period.end.year(),
        }
    }
}

impl ParsedPeriod {
    pub fn new(
        start_month: u32,
        start_year: i32,
        end_month: u32,
        end_year: i32,
    ) -> Result<Self, PeriodError> {
        let start = MonthKey::new(start_month, start_year)
            .ok_or(PeriodError::MonthOutOfRange(start_month))?;
        let end =
            MonthKey::new(end_month, end_year).ok_or(PeriodError::MonthOutOfRange(end_month))?;
        Self::from_keys(start, end)
    }

    pub fn from_keys(start: MonthKey, end: MonthKey) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(month: MonthKey) -> Self {
        Self {
            start: month,
            end: month,
        }
    }

    pub fn start_month(&self) -> u32 {
        self.start.month()
    }

    pub fn start_year(&self) -> i32 {
        self.start.year()
    }

    pub fn end_month(&self) -> u32 {
        self.end.month()
    }

    pub fn end_year(&self) -> i32 {
        self.end.year()
    }

    pub fn start(&self) -> MonthKey {
        self.start
    }

    pub fn end(&self) -> MonthKey {
        self.end
    }

    pub fn contains(&self, month: MonthKey) -> bool {
        month >= self.start && month <= self.end
    }

    /// Inclusive number of calendar months covered.
    pub fn month_count(&self) -> usize {
        (self.start.months_until(&self.end) + 1) as usize
    }

    pub fn is_single_month(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for ParsedPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_month() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} - {}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`ParsedPeriod`] values.
pub enum PeriodError {
    MonthOutOfRange(u32),
    Reversed { start: MonthKey, end: MonthKey },
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::MonthOutOfRange(month) => {
                write!(f, "month index {month} is outside 0-11")
            }
            PeriodError::Reversed { start, end } => {
                write!(f, "period start {start} is after end {end}")
            }
        }
    }
}

impl std::error::Error for PeriodError {}
