//! Bank statement records owning their monthly balances.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{balance::MonthlyBalances, month::MonthKey};

/// Workflow state of a statement record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatementStatus {
    /// Uploaded, period not resolved yet.
    #[default]
    Pending,
    /// Period resolved and monthly balances present.
    Extracted,
    /// Every monthly balance verified; the record is filed.
    Finalized,
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatementStatus::Pending => "pending",
            StatementStatus::Extracted => "extracted",
            StatementStatus::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Bookkeeping balance recorded for one month, e.g. from QuickBooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalBalanceEntry {
    pub month: MonthKey,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One bank statement uploaded for a company, possibly covering several months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankStatement {
    pub id: Uuid,
    pub bank_id: String,
    pub company_id: String,
    /// Month the record was filed under.
    pub statement_month: MonthKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub monthly_balances: MonthlyBalances,
    #[serde(default)]
    pub external_balances: Vec<ExternalBalanceEntry>,
    #[serde(default)]
    pub status: StatementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BankStatement {
    pub fn new(
        bank_id: impl Into<String>,
        company_id: impl Into<String>,
        statement_month: MonthKey,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bank_id: bank_id.into(),
            company_id: company_id.into(),
            statement_month,
            statement_period: None,
            document_path: None,
            currency: None,
            monthly_balances: MonthlyBalances::new(),
            external_balances: Vec::new(),
            status: StatementStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.statement_period = Some(period.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_finalized(&self) -> bool {
        self.status == StatementStatus::Finalized
    }

    pub fn external_balance(&self, month: MonthKey) -> Option<Decimal> {
        self.external_balances
            .iter()
            .find(|entry| entry.month == month)
            .map(|entry| entry.amount)
    }

    /// Records the bookkeeping figure for `month`, replacing any previous one.
    pub fn set_external_balance(
        &mut self,
        month: MonthKey,
        amount: Decimal,
        source: Option<String>,
    ) {
        match self
            .external_balances
            .iter_mut()
            .find(|entry| entry.month == month)
        {
            Some(entry) => {
                entry.amount = amount;
                entry.source = source;
            }
            None => {
                self.external_balances.push(ExternalBalanceEntry {
                    month,
                    amount,
                    source,
                });
                self.external_balances.sort_by_key(|entry| entry.month);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_balance_is_replaced_not_duplicated() {
        let month = MonthKey::new(2, 2024).unwrap();
        let mut statement = BankStatement::new("equity", "acme", month);
        statement.set_external_balance(month, Decimal::from(10), None);
        statement.set_external_balance(month, Decimal::from(12), Some("QuickBooks".into()));
        assert_eq!(statement.external_balances.len(), 1);
        assert_eq!(statement.external_balance(month), Some(Decimal::from(12)));
    }

    #[test]
    fn statement_roundtrips_through_json() {
        let month = MonthKey::new(0, 2024).unwrap();
        let statement = BankStatement::new("kcb", "acme", month).with_period("January 2024");
        let json = serde_json::to_string(&statement).unwrap();
        let restored: BankStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, statement.id);
        assert_eq!(restored.statement_period.as_deref(), Some("January 2024"));
        assert_eq!(restored.status, StatementStatus::Pending);
    }
}
