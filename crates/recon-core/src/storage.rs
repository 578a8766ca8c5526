use std::{collections::HashSet, path::PathBuf};

use recon_domain::{BankStatement, MonthKey};
use uuid::Uuid;

use crate::{month_range::enumerate_months, period_parser::parse_period, CoreError};

/// Describes a persisted backup artifact for a statement.
#[derive(Debug, Clone)]
pub struct StatementBackupInfo {
    pub statement_id: Uuid,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over the record store holding statements and their balances.
pub trait StatementStorage: Send + Sync {
    fn save_statement(&self, statement: &BankStatement) -> Result<(), CoreError>;
    fn load_statement(&self, id: Uuid) -> Result<BankStatement, CoreError>;
    /// Looks a statement up by its `(bank_id, month)` filing key.
    fn find_statement(
        &self,
        bank_id: &str,
        month: MonthKey,
    ) -> Result<Option<BankStatement>, CoreError>;
    fn list_statements(&self) -> Result<Vec<BankStatement>, CoreError>;
    fn delete_statement(&self, id: Uuid) -> Result<(), CoreError>;
    fn backup_statement(
        &self,
        statement: &BankStatement,
        note: Option<&str>,
    ) -> Result<StatementBackupInfo, CoreError>;
    fn list_backups(&self, id: Uuid) -> Result<Vec<StatementBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &StatementBackupInfo) -> Result<BankStatement, CoreError>;
}

/// Detects inconsistencies within a statement snapshot.
pub fn statement_warnings(statement: &BankStatement) -> Vec<String> {
    let mut warnings = Vec::new();
    let period = parse_period(statement.statement_period.as_deref());

    if let Some(text) = statement.statement_period.as_deref() {
        if period.is_none() {
            warnings.push(format!("statement period `{text}` could not be parsed"));
        }
    }

    if let Some(period) = period.as_ref() {
        let expected: HashSet<MonthKey> = enumerate_months(period).into_iter().collect();
        for month in &expected {
            if !statement.monthly_balances.contains(*month) {
                warnings.push(format!("no monthly balance for {month}"));
            }
        }
        for month in statement.monthly_balances.keys() {
            if !expected.contains(&month) {
                warnings.push(format!("balance for {month} lies outside period {period}"));
            }
        }
    }

    for balance in &statement.monthly_balances {
        if balance.is_verified && balance.verified_by.is_none() {
            warnings.push(format!("balance for {} verified without a verifier", balance.key()));
        }
        if let Some(date) = balance.closing_date {
            if !balance.key().contains(date) {
                warnings.push(format!(
                    "closing date {date} does not fall in {}",
                    balance.key()
                ));
            }
        }
    }

    for entry in &statement.external_balances {
        if !statement.monthly_balances.contains(entry.month) {
            warnings.push(format!(
                "external balance for {} has no statement balance",
                entry.month
            ));
        }
    }
    warnings.sort();
    warnings
}
