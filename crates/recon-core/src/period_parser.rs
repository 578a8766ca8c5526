//! Parses free-text statement periods such as `January - July 2024` or
//! `01/01/2024 - 31/01/2024` into month ranges.
//!
//! Pattern classes are tried in a fixed order and the first one that yields a
//! valid period wins:
//!
//! 1. numeric date range `DD/MM/YYYY - DD/MM/YYYY`
//! 2. same-year month names `January - July 2024`
//! 3. cross-year month names `November 2023 - February 2024`
//! 4. single month `March 2024`
//!
//! A candidate whose numbers do not parse or whose month names do not resolve
//! is skipped and the next candidate is tried. A candidate that resolves but
//! starts after it ends stops the whole parse with `None`, so the tail of a
//! reversed range is never read as a single month. Day-of-month values are
//! captured but never validated.

use once_cell::sync::Lazy;
use recon_domain::{MonthKey, ParsedPeriod, PeriodError};
use regex::{Captures, Regex};

const MONTH_PREFIXES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static NUMERIC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\s*[-\x{2013}\x{2014}]\s*(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b",
    )
    .expect("numeric range regex")
});

static SAME_YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]+)\.?\s*[-\x{2013}\x{2014}]\s*([a-z]+)\.?,?\s+(\d{4})\b")
        .expect("same-year range regex")
});

static CROSS_YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([a-z]+)\.?,?\s+(\d{4})\s*[-\x{2013}\x{2014}]\s*([a-z]+)\.?,?\s+(\d{4})\b",
    )
    .expect("cross-year range regex")
});

static SINGLE_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z]+)\.?,?\s+(\d{4})\b").expect("single month regex")
});

/// Which pattern class produced a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodPattern {
    NumericRange,
    SameYearRange,
    CrossYearRange,
    SingleMonth,
}

/// Outcome of reading one regex match.
enum Candidate {
    Period(ParsedPeriod),
    /// Malformed numbers or unknown month names.
    Skip,
    Reversed,
}

impl From<Result<ParsedPeriod, PeriodError>> for Candidate {
    fn from(result: Result<ParsedPeriod, PeriodError>) -> Self {
        match result {
            Ok(period) => Candidate::Period(period),
            Err(PeriodError::Reversed { .. }) => Candidate::Reversed,
            Err(PeriodError::MonthOutOfRange(_)) => Candidate::Skip,
        }
    }
}

/// Parses an optional period string. Absent or blank input yields `None`.
pub fn parse_period(text: Option<&str>) -> Option<ParsedPeriod> {
    text.and_then(parse_period_str)
}

pub fn parse_period_str(text: &str) -> Option<ParsedPeriod> {
    parse_period_with_pattern(text).map(|(period, _)| period)
}

/// Like [`parse_period_str`] but also reports the matching pattern class.
pub fn parse_period_with_pattern(text: &str) -> Option<(ParsedPeriod, PeriodPattern)> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let classes: [(&Regex, fn(&Captures) -> Candidate, PeriodPattern); 4] = [
        (&*NUMERIC_RANGE, numeric_range, PeriodPattern::NumericRange),
        (&*SAME_YEAR_RANGE, same_year_range, PeriodPattern::SameYearRange),
        (&*CROSS_YEAR_RANGE, cross_year_range, PeriodPattern::CrossYearRange),
        (&*SINGLE_MONTH, single_month, PeriodPattern::SingleMonth),
    ];
    for (regex, build, pattern) in classes {
        if let Some(period) = first_match(regex, text, build)? {
            return Some((period, pattern));
        }
    }
    None
}

/// Resolves a month name by its first three letters, case-insensitively.
///
/// Returns the zero-based month index, or `None` for names shorter than three
/// characters or without a known prefix.
pub fn month_index(name: &str) -> Option<u32> {
    let lowered = name.trim().to_lowercase();
    let prefix = lowered.get(..3)?;
    MONTH_PREFIXES
        .iter()
        .position(|candidate| *candidate == prefix)
        .map(|index| index as u32)
}

/// First usable match of `regex`. The outer `None` means a reversed range
/// was found and parsing must stop.
fn first_match(
    regex: &Regex,
    text: &str,
    build: fn(&Captures) -> Candidate,
) -> Option<Option<ParsedPeriod>> {
    for caps in regex.captures_iter(text) {
        match build(&caps) {
            Candidate::Period(period) => return Some(Some(period)),
            Candidate::Reversed => return None,
            Candidate::Skip => {}
        }
    }
    Some(None)
}

fn group<T: std::str::FromStr>(caps: &Captures, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

fn numeric_range(caps: &Captures) -> Candidate {
    let parts = (|| {
        let start_month = group::<u32>(caps, 2)?.checked_sub(1)?;
        let start_year: i32 = group(caps, 3)?;
        let end_month = group::<u32>(caps, 5)?.checked_sub(1)?;
        let end_year: i32 = group(caps, 6)?;
        Some((start_month, start_year, end_month, end_year))
    })();
    match parts {
        Some((start_month, start_year, end_month, end_year)) => {
            ParsedPeriod::new(start_month, start_year, end_month, end_year).into()
        }
        None => Candidate::Skip,
    }
}

fn same_year_range(caps: &Captures) -> Candidate {
    let parts = (|| {
        let start_month = month_index(caps.get(1)?.as_str())?;
        let end_month = month_index(caps.get(2)?.as_str())?;
        let year: i32 = group(caps, 3)?;
        Some((start_month, end_month, year))
    })();
    match parts {
        Some((start_month, end_month, year)) => {
            ParsedPeriod::new(start_month, year, end_month, year).into()
        }
        None => Candidate::Skip,
    }
}

fn cross_year_range(caps: &Captures) -> Candidate {
    let parts = (|| {
        let start_month = month_index(caps.get(1)?.as_str())?;
        let start_year: i32 = group(caps, 2)?;
        let end_month = month_index(caps.get(3)?.as_str())?;
        let end_year: i32 = group(caps, 4)?;
        Some((start_month, start_year, end_month, end_year))
    })();
    match parts {
        Some((start_month, start_year, end_month, end_year)) => {
            ParsedPeriod::new(start_month, start_year, end_month, end_year).into()
        }
        None => Candidate::Skip,
    }
}

fn single_month(caps: &Captures) -> Candidate {
    let month = caps
        .get(1)
        .and_then(|name| month_index(name.as_str()))
        .and_then(|month| MonthKey::new(month, group(caps, 2)?));
    match month {
        Some(month) => Candidate::Period(ParsedPeriod::single(month)),
        None => Candidate::Skip,
    }
}
