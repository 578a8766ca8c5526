//! Per-month balance records attributed to a bank statement.

use std::collections::{btree_map, BTreeMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::month::MonthKey;

/// Default page a placeholder balance points at.
pub const DEFAULT_STATEMENT_PAGE: u32 = 1;

/// Region of a rendered page the user highlighted when picking a balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightCoordinates {
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Opening and closing figures for one calendar month of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBalance {
    #[serde(flatten)]
    key: MonthKey,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    #[serde(default = "MonthlyBalance::default_page")]
    pub statement_page: u32,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub highlight_coordinates: Option<HighlightCoordinates>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

impl MonthlyBalance {
    /// Zero-balance entry for a month that has not been filled in yet.
    pub fn placeholder(key: MonthKey) -> Self {
        Self {
            key,
            opening_balance: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
            statement_page: DEFAULT_STATEMENT_PAGE,
            closing_date: None,
            highlight_coordinates: None,
            is_verified: false,
            verified_by: None,
            verified_at: None,
        }
    }

    fn default_page() -> u32 {
        DEFAULT_STATEMENT_PAGE
    }

    pub fn key(&self) -> MonthKey {
        self.key
    }

    pub fn month(&self) -> u32 {
        self.key.month()
    }

    pub fn year(&self) -> i32 {
        self.key.year()
    }

    /// True while the entry still carries nothing but placeholder values.
    pub fn is_placeholder(&self) -> bool {
        self.opening_balance.is_zero()
            && self.closing_balance.is_zero()
            && self.closing_date.is_none()
            && self.highlight_coordinates.is_none()
            && !self.is_verified
    }

    pub fn mark_verified(&mut self, verifier: impl Into<String>, at: DateTime<Utc>) {
        self.is_verified = true;
        self.verified_by = Some(verifier.into());
        self.verified_at = Some(at);
    }

    pub fn clear_verification(&mut self) {
        self.is_verified = false;
        self.verified_by = None;
        self.verified_at = None;
    }
}

/// Monthly balances of one statement, unique per `(year, month)`.
///
/// Serialized as an array ordered chronologically. When an array holds
/// several entries for the same month, the first one wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyBalances {
    entries: BTreeMap<MonthKey, MonthlyBalance>,
}

impl MonthlyBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the collection and reports keys that were dropped as duplicates.
    pub fn from_entries(
        entries: impl IntoIterator<Item = MonthlyBalance>,
    ) -> (Self, Vec<MonthKey>) {
        let mut balances = Self::new();
        let mut duplicates = Vec::new();
        for entry in entries {
            let key = entry.key();
            if !balances.insert_if_absent(entry) {
                duplicates.push(key);
            }
        }
        (balances, duplicates)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: MonthKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&self, key: MonthKey) -> Option<&MonthlyBalance> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: MonthKey) -> Option<&mut MonthlyBalance> {
        self.entries.get_mut(&key)
    }

    /// Inserts the entry unless its month is already present.
    pub fn insert_if_absent(&mut self, balance: MonthlyBalance) -> bool {
        match self.entries.entry(balance.key()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(balance);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Returns the entry for `key`, creating a placeholder when missing.
    pub fn get_or_placeholder(&mut self, key: MonthKey) -> &mut MonthlyBalance {
        self.entries
            .entry(key)
            .or_insert_with(|| MonthlyBalance::placeholder(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthlyBalance> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MonthlyBalance> {
        self.entries.values_mut()
    }

    pub fn all_verified(&self) -> bool {
        self.entries.values().all(|balance| balance.is_verified)
    }

    pub fn unverified(&self) -> Vec<MonthKey> {
        self.entries
            .values()
            .filter(|balance| !balance.is_verified)
            .map(MonthlyBalance::key)
            .collect()
    }
}

impl<'a> IntoIterator for &'a MonthlyBalances {
    type Item = &'a MonthlyBalance;
    type IntoIter = btree_map::Values<'a, MonthKey, MonthlyBalance>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl Serialize for MonthlyBalances {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for MonthlyBalances {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<MonthlyBalance>::deserialize(deserializer)?;
        Ok(Self::from_entries(entries).0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(month: u32, year: i32) -> MonthKey {
        MonthKey::new(month, year).unwrap()
    }

    #[test]
    fn placeholder_uses_zero_defaults() {
        let balance = MonthlyBalance::placeholder(key(3, 2024));
        assert_eq!(balance.opening_balance, Decimal::ZERO);
        assert_eq!(balance.closing_balance, Decimal::ZERO);
        assert_eq!(balance.statement_page, 1);
        assert!(balance.closing_date.is_none());
        assert!(!balance.is_verified);
        assert!(balance.is_placeholder());
    }

    #[test]
    fn insert_if_absent_keeps_first_entry() {
        let mut balances = MonthlyBalances::new();
        let mut first = MonthlyBalance::placeholder(key(0, 2024));
        first.closing_balance = Decimal::new(5000, 2);
        assert!(balances.insert_if_absent(first));
        assert!(!balances.insert_if_absent(MonthlyBalance::placeholder(key(0, 2024))));
        assert_eq!(
            balances.get(key(0, 2024)).unwrap().closing_balance,
            Decimal::new(5000, 2)
        );
    }

    #[test]
    fn serializes_as_ordered_array_and_collapses_duplicates() {
        let json = r#"[
            {"month": 1, "year": 2024, "opening_balance": "10", "closing_balance": "20"},
            {"month": 0, "year": 2024, "opening_balance": "0", "closing_balance": "10"},
            {"month": 1, "year": 2024, "opening_balance": "99", "closing_balance": "99"}
        ]"#;
        let balances: MonthlyBalances = serde_json::from_str(json).unwrap();
        assert_eq!(balances.len(), 2);
        let keys: Vec<_> = balances.keys().collect();
        assert_eq!(keys, vec![key(0, 2024), key(1, 2024)]);
        assert_eq!(
            balances.get(key(1, 2024)).unwrap().closing_balance,
            Decimal::from(20)
        );

        let value = serde_json::to_value(&balances).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["month"], 0);
        assert_eq!(value[1]["statement_page"], 1);
    }
}
