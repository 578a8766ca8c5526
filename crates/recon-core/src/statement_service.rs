use recon_domain::{BankStatement, MonthKey, StatementStatus};
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    balance_service::{BalanceService, SyncOutcome},
    error::CoreError,
};

pub struct StatementService;

impl StatementService {
    /// Creates a statement record and synthesizes balances for its period, if any.
    pub fn create(
        bank_id: &str,
        company_id: &str,
        statement_month: MonthKey,
        period: Option<&str>,
    ) -> Result<(BankStatement, SyncOutcome), CoreError> {
        if bank_id.trim().is_empty() {
            return Err(CoreError::Validation("bank id is required".into()));
        }
        if company_id.trim().is_empty() {
            return Err(CoreError::Validation("company id is required".into()));
        }
        let mut statement = BankStatement::new(bank_id.trim(), company_id.trim(), statement_month);
        statement.statement_period = period
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        let outcome = BalanceService::sync_with_period(&mut statement);
        Ok((statement, outcome))
    }

    /// Replaces the period string and re-synthesizes balances. Entries for
    /// months outside the new period are kept.
    pub fn set_period(statement: &mut BankStatement, period: Option<String>) -> SyncOutcome {
        statement.statement_period = period
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        statement.touch();
        BalanceService::sync_with_period(statement)
    }

    pub fn record_external_balance(
        statement: &mut BankStatement,
        month: MonthKey,
        amount: Decimal,
        source: Option<String>,
    ) {
        statement.set_external_balance(month, amount, source);
        statement.touch();
    }

    /// Files the statement. Every monthly balance must be verified.
    pub fn finalize(statement: &mut BankStatement) -> Result<(), CoreError> {
        if statement.monthly_balances.is_empty() {
            return Err(CoreError::InvalidOperation(
                "statement has no monthly balances".into(),
            ));
        }
        let pending = statement.monthly_balances.unverified();
        if !pending.is_empty() {
            let months: Vec<String> = pending.iter().map(ToString::to_string).collect();
            return Err(CoreError::Validation(format!(
                "unverified months: {}",
                months.join(", ")
            )));
        }
        statement.status = StatementStatus::Finalized;
        statement.touch();
        info!(statement = %statement.id, bank = %statement.bank_id, "statement finalized");
        Ok(())
    }
}
