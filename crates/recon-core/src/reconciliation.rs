use recon_domain::{
    BankStatement, MonthKey, MonthReconciliation, Reconciliation, ReconciliationStatus,
};
use rust_decimal::Decimal;

use crate::error::CoreError;

/// Largest absolute difference still treated as reconciled: 0.01.
pub fn reconciliation_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Compares a statement balance with an external bookkeeping balance.
///
/// Both amounts are expected in the same currency. The delta is reported as
/// `statement_balance - external_balance` whatever the outcome.
pub fn reconcile(statement_balance: Decimal, external_balance: Decimal) -> Reconciliation {
    let delta = statement_balance - external_balance;
    let status = if delta.abs() <= reconciliation_tolerance() {
        ReconciliationStatus::Reconciled
    } else {
        ReconciliationStatus::Difference
    };
    Reconciliation { status, delta }
}

pub struct ReconciliationService;

impl ReconciliationService {
    pub fn reconcile_month(
        statement: &BankStatement,
        month: MonthKey,
        external_balance: Decimal,
    ) -> Result<Reconciliation, CoreError> {
        let balance = statement
            .monthly_balances
            .get(month)
            .ok_or(CoreError::MonthNotFound(month))?;
        Ok(reconcile(balance.closing_balance, external_balance))
    }

    /// Reconciles every month that has both a balance and a recorded external figure.
    pub fn reconcile_statement(statement: &BankStatement) -> Vec<MonthReconciliation> {
        statement
            .monthly_balances
            .iter()
            .filter_map(|balance| {
                let external = statement.external_balance(balance.key())?;
                Some(MonthReconciliation {
                    month: balance.key(),
                    statement_balance: balance.closing_balance,
                    external_balance: external,
                    outcome: reconcile(balance.closing_balance, external),
                })
            })
            .collect()
    }
}
