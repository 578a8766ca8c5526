//! Outcomes of comparing statement balances with bookkeeping figures.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    Reconciled,
    Difference,
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationStatus::Reconciled => f.write_str("Reconciled"),
            ReconciliationStatus::Difference => f.write_str("Difference"),
        }
    }
}

/// Result of one comparison. `delta` is `statement - external`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reconciliation {
    pub status: ReconciliationStatus,
    pub delta: Decimal,
}

impl Reconciliation {
    pub fn is_reconciled(&self) -> bool {
        self.status == ReconciliationStatus::Reconciled
    }
}

/// Per-month reconciliation row for a statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthReconciliation {
    pub month: MonthKey,
    pub statement_balance: Decimal,
    pub external_balance: Decimal,
    pub outcome: Reconciliation,
}
