//! Heuristics over text rendered from statement PDFs: where the statement
//! period is written, which page each month starts on, and amounts picked
//! from selected text.

use std::collections::BTreeMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use recon_domain::{MonthKey, ParsedPeriod};
use regex::Regex;
use rust_decimal::Decimal;

use crate::period_parser::{month_index, parse_period_with_pattern, PeriodPattern};

/// Form feed emitted between pages by common PDF text renderers.
pub const PAGE_SEPARATOR: char = '\u{c}';

static CONNECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(?:to|through|thru|until|till)\s+").expect("connector regex")
});

static LEADING_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*from\s+").expect("leading from regex"));

static DAY_NAMED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?:st|nd|rd|th)?[\s\-]+([a-z]{3,9})\.?[\s\-,]+(\d{4})\b")
        .expect("day named date regex")
});

static PERIOD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:statement\s+period|period|from|statement\s+date|for\s+the\s+month)\b")
        .expect("period label regex")
});

static HEADER_DATE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:statement\s+period|statement\s+date|for\s+the\s+month)\b")
        .expect("header date label regex")
});

static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})\b").expect("numeric date regex")
});

static NAMED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})[\s\-]([a-z]{3,9})[\s\-,]+(\d{4})\b").expect("named date regex")
});

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("amount regex"));

static BALANCE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(opening\s+balance|balance\s+brought\s+forward|brought\s+forward|b/f|closing\s+balance|balance\s+carried\s+forward|carried\s+forward|c/f)\b",
    )
    .expect("balance label regex")
});

/// A statement period found in rendered page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedPeriod {
    pub period: ParsedPeriod,
    /// One-based page number.
    pub page: u32,
    pub line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceKind {
    Opening,
    Closing,
}

/// A labelled opening or closing balance line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceHit {
    pub page: u32,
    pub kind: BalanceKind,
    pub amount: Decimal,
    pub line: String,
}

/// Splits renderer output into pages on form feeds, dropping a trailing empty page.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(PAGE_SEPARATOR).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Rewrites a period line into a form the period parser reads.
///
/// Connector words become dashes (`From 01/01/2024 to 31/01/2024`) and day
/// numbers are dropped from named dates (`01-Jan-2024` reads as `Jan 2024`).
pub fn normalize_period_line(line: &str) -> String {
    let joined = CONNECTOR.replace_all(line, " - ");
    let undated = DAY_NAMED_DATE.replace_all(&joined, "${1} ${2}");
    LEADING_FROM.replace(&undated, "").trim().to_string()
}

/// Finds the statement period in rendered pages.
///
/// Labelled lines (`Statement Period`, `From`, ...) are tried first on every
/// page. Otherwise the first unlabelled line holding an explicit range is used;
/// lone month mentions are ignored there since headers and footers carry them.
pub fn detect_period<S: AsRef<str>>(pages: &[S]) -> Option<DetectedPeriod> {
    let lines = || {
        pages.iter().enumerate().flat_map(|(index, page)| {
            page.as_ref()
                .lines()
                .map(move |line| (index as u32 + 1, line))
        })
    };

    let labelled = lines()
        .filter(|(_, line)| PERIOD_LABEL.is_match(line))
        .find_map(|(page, line)| detect_in_line(page, line, true));
    if labelled.is_some() {
        return labelled;
    }
    lines().find_map(|(page, line)| detect_in_line(page, line, false))
}

fn detect_in_line(page: u32, line: &str, allow_single: bool) -> Option<DetectedPeriod> {
    let normalized = normalize_period_line(line);
    let (period, pattern) = parse_period_with_pattern(&normalized)?;
    if !allow_single && pattern == PeriodPattern::SingleMonth {
        return None;
    }
    Some(DetectedPeriod {
        period,
        page,
        line: line.trim().to_string(),
    })
}

/// Maps each month of `period` to the first page showing one of its dates.
///
/// Lines stating a period range or a statement date are headers and are
/// skipped. Months without any dated line are absent from the result.
pub fn locate_month_pages<S: AsRef<str>>(
    pages: &[S],
    period: &ParsedPeriod,
) -> BTreeMap<MonthKey, u32> {
    let mut first_pages = BTreeMap::new();
    for (index, page) in pages.iter().enumerate() {
        let page_number = index as u32 + 1;
        let dated = page
            .as_ref()
            .lines()
            .filter(|line| !is_header_line(line))
            .flat_map(dates_in);
        for month in dated {
            if period.contains(month) {
                first_pages.entry(month).or_insert(page_number);
            }
        }
    }
    first_pages
}

fn is_header_line(line: &str) -> bool {
    HEADER_DATE_LABEL.is_match(line) || detect_in_line(0, line, false).is_some()
}

fn dates_in(text: &str) -> Vec<MonthKey> {
    let numeric = NUMERIC_DATE.captures_iter(text).filter_map(|caps| {
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let year: i32 = caps.get(3)?.as_str().parse().ok()?;
        MonthKey::from_calendar(month, year)
    });
    let named = NAMED_DATE.captures_iter(text).filter_map(|caps| {
        let month = month_index(caps.get(2)?.as_str())?;
        let year: i32 = caps.get(3)?.as_str().parse().ok()?;
        MonthKey::new(month, year)
    });
    numeric.chain(named).collect()
}

/// Parses an amount from user-selected text such as `KES 1,234.50`,
/// `(2,000.00)` or `350.00 DR`.
///
/// Parentheses, a minus sign right before the number or a `DR` suffix make
/// the amount negative. Returns `None` when no number is present.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let found = AMOUNT.find(trimmed)?;
    signed_amount(trimmed, found)
}

/// Parses the last number on a line, where statements print balances.
fn parse_trailing_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let found = AMOUNT.find_iter(trimmed).last()?;
    signed_amount(trimmed, found)
}

fn signed_amount(text: &str, found: regex::Match<'_>) -> Option<Decimal> {
    let digits = found.as_str().replace(',', "");
    let value = Decimal::from_str(&digits).ok()?;

    let before = &text[..found.start()];
    let after = &text[found.end()..];
    let upper_after = after.trim().to_ascii_uppercase();
    let negative = before.trim_end().ends_with('-')
        || (before.contains('(') && after.contains(')'))
        || upper_after.starts_with("DR")
        || upper_after.ends_with("DR");
    Some(if negative { -value } else { value })
}

/// Collects lines labelled as opening or closing balances, with their amounts.
pub fn find_labelled_balances<S: AsRef<str>>(pages: &[S]) -> Vec<BalanceHit> {
    let mut hits = Vec::new();
    for (index, page) in pages.iter().enumerate() {
        for line in page.as_ref().lines() {
            let Some(label) = BALANCE_LABEL.find(line) else {
                continue;
            };
            let Some(amount) = parse_trailing_amount(&line[label.end()..]) else {
                continue;
            };
            let lowered = label.as_str().to_ascii_lowercase();
            let kind =
                if lowered.contains("opening") || lowered.contains("brought") || lowered == "b/f" {
                    BalanceKind::Opening
                } else {
                    BalanceKind::Closing
                };
            hits.push(BalanceHit {
                page: index as u32 + 1,
                kind,
                amount,
                line: line.trim().to_string(),
            });
        }
    }
    hits
}
