//! Currency spellings found on statements and amount rendering.
//!
//! Reconciliation compares raw numbers, so both sides must be expressed in
//! the same currency before [`recon_core::reconcile`] is called. Statements
//! spell currencies loosely (`KSHS`, `Kenya Shillings`, `$`); these helpers
//! map them onto ISO 4217 codes.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("KES")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-KE".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

impl LocaleConfig {
    /// Separators for a BCP 47 tag. Unknown tags use `1,234.56`.
    pub fn for_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (decimal_separator, grouping_separator) = match language.as_str() {
            "de" | "es" | "it" | "nl" | "pt" | "id" => (',', '.'),
            "fr" | "sv" | "nb" | "fi" => (',', ' '),
            _ => ('.', ','),
        };
        Self {
            language_tag: tag.to_string(),
            decimal_separator,
            grouping_separator,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatOptions {
    pub currency_display: CurrencyDisplay,
    pub negative_style: NegativeStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            currency_display: CurrencyDisplay::Code,
            negative_style: NegativeStyle::Sign,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegativeStyle {
    Sign,
    Parentheses,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CurrencyDisplay {
    Symbol,
    Code,
    None,
}

/// Maps a loose currency spelling to its ISO code.
///
/// Three-letter alphabetic input is taken as a code already. Returns `None`
/// for blank or unrecognised text.
pub fn normalize_currency(raw: &str) -> Option<CurrencyCode> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('.')
        .chars()
        .filter(|c| !matches!(c, '.' | '\''))
        .collect::<String>()
        .to_ascii_lowercase();
    let words = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let code = match words.as_str() {
        "" => return None,
        "ksh" | "kshs" | "kes" | "ks" | "kenya shilling" | "kenya shillings"
        | "kenyan shilling" | "kenyan shillings" => "KES",
        "ush" | "ushs" | "uganda shilling" | "uganda shillings" | "ugandan shillings" => "UGX",
        "tsh" | "tshs" | "tanzania shilling" | "tanzania shillings"
        | "tanzanian shillings" => "TZS",
        "$" | "us$" | "usd" | "us dollar" | "us dollars" | "dollar" | "dollars" => "USD",
        "€" | "eur" | "euro" | "euros" => "EUR",
        "£" | "gbp" | "pound" | "pounds" | "pound sterling" | "sterling" => "GBP",
        other if other.len() == 3 && other.chars().all(|c| c.is_ascii_alphabetic()) => {
            return Some(CurrencyCode::new(other));
        }
        _ => return None,
    };
    Some(CurrencyCode::new(code))
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "KES" => "KSh".into(),
        "UGX" => "USh".into(),
        "TZS" => "TSh".into(),
        _ => code.into(),
    }
}

pub fn minor_units_for(code: &str) -> u32 {
    match code {
        "JPY" | "UGX" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Renders `value` with `precision` decimals and locale separators.
pub fn format_number(locale: &LocaleConfig, value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let body = format!("{:.*}", precision as usize, rounded);
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (body.as_str(), None),
    };
    let grouped = match int_part.strip_prefix('-') {
        Some(digits) => format!("-{}", group_digits(digits, locale.grouping_separator)),
        None => group_digits(int_part, locale.grouping_separator),
    };
    match fraction {
        Some(fraction) => format!("{grouped}{}{fraction}", locale.decimal_separator),
        None => grouped,
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Formats an amount in `code` with its minor units and the requested sign style.
pub fn format_amount(
    amount: Decimal,
    code: &CurrencyCode,
    locale: &LocaleConfig,
    options: &FormatOptions,
) -> String {
    let precision = minor_units_for(code.as_str());
    let mut body = format_number(locale, amount.abs(), precision);
    if amount.is_sign_negative() && !amount.is_zero() {
        body = match options.negative_style {
            NegativeStyle::Sign => format!("-{body}"),
            NegativeStyle::Parentheses => format!("({body})"),
        };
    }
    match options.currency_display {
        CurrencyDisplay::Symbol => format!("{} {body}", symbol_for(code.as_str())),
        CurrencyDisplay::Code => format!("{code} {body}"),
        CurrencyDisplay::None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn groups_large_values() {
        let locale = LocaleConfig::default();
        let value = Decimal::from_str("1234567.891").unwrap();
        assert_eq!(format_number(&locale, value, 2), "1,234,567.89");
        assert_eq!(format_number(&locale, Decimal::from(-1000), 0), "-1,000");
    }

    #[test]
    fn continental_locales_swap_separators() {
        let locale = LocaleConfig::for_tag("de-DE");
        let value = Decimal::from_str("9876.5").unwrap();
        assert_eq!(format_number(&locale, value, 2), "9.876,50");
    }
}
