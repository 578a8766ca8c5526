use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use recon_domain::{
    BankStatement, HighlightCoordinates, MonthKey, MonthlyBalance, MonthlyBalances,
    ParsedPeriod, StatementStatus, DEFAULT_STATEMENT_PAGE,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    error::CoreError, month_range::enumerate_months, period_parser::parse_period,
    statement_text::parse_amount,
};

/// Returns `existing` plus a zero placeholder for every month in `months`
/// that has no entry yet. Existing entries are never modified.
pub fn synthesize_balances(months: &[MonthKey], existing: &MonthlyBalances) -> MonthlyBalances {
    let mut balances = existing.clone();
    ensure_months(&mut balances, months);
    balances
}

/// In-place variant of [`synthesize_balances`]; returns the months it added.
pub fn ensure_months(balances: &mut MonthlyBalances, months: &[MonthKey]) -> Vec<MonthKey> {
    let mut added = Vec::new();
    for month in months {
        if balances.insert_if_absent(MonthlyBalance::placeholder(*month)) {
            added.push(*month);
        }
    }
    added
}

/// Result of re-reading a statement's period string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub period: Option<ParsedPeriod>,
    pub added: Vec<MonthKey>,
}

/// A balance picked by selecting text on a rendered statement page.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosingSelection {
    pub text: String,
    pub page: u32,
    pub coordinates: Option<HighlightCoordinates>,
    pub closing_date: Option<NaiveDate>,
}

/// Manual edits to a monthly balance. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceUpdate {
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub statement_page: Option<u32>,
    pub closing_date: Option<Option<NaiveDate>>,
}

impl BalanceUpdate {
    pub fn is_empty(&self) -> bool {
        self.opening_balance.is_none()
            && self.closing_balance.is_none()
            && self.statement_page.is_none()
            && self.closing_date.is_none()
    }
}

pub struct BalanceService;

impl BalanceService {
    /// Parses `statement_period` and makes sure every month it spans has a
    /// balance entry. An unparsable period is logged and leaves the balances
    /// untouched.
    pub fn sync_with_period(statement: &mut BankStatement) -> SyncOutcome {
        let Some(period) = parse_period(statement.statement_period.as_deref()) else {
            if let Some(text) = statement.statement_period.as_deref() {
                warn!(
                    statement = %statement.id,
                    period = text,
                    "could not parse statement period"
                );
            }
            return SyncOutcome {
                period: None,
                added: Vec::new(),
            };
        };

        let months = enumerate_months(&period);
        let added = ensure_months(&mut statement.monthly_balances, &months);
        debug!(
            statement = %statement.id,
            %period,
            added = added.len(),
            "synthesized monthly balances"
        );

        if !added.is_empty() || statement.status == StatementStatus::Pending {
            statement.status = StatementStatus::Extracted;
        }
        if !added.is_empty() {
            statement.touch();
        }
        SyncOutcome {
            period: Some(period),
            added,
        }
    }

    /// Manual "add month". Fails when the month already has an entry.
    pub fn add_month(statement: &mut BankStatement, month: MonthKey) -> Result<(), CoreError> {
        if !statement
            .monthly_balances
            .insert_if_absent(MonthlyBalance::placeholder(month))
        {
            return Err(CoreError::DuplicateMonth(month));
        }
        reopen(statement);
        Ok(())
    }

    /// Assigns a closing balance from selected page text, creating the month
    /// entry when needed. The entry loses any previous verification.
    pub fn assign_closing_balance(
        statement: &mut BankStatement,
        month: MonthKey,
        selection: &ClosingSelection,
    ) -> Result<Decimal, CoreError> {
        let amount = parse_amount(&selection.text)
            .ok_or_else(|| CoreError::InvalidAmount(selection.text.clone()))?;
        if let Some(date) = selection.closing_date {
            ensure_date_in_month(month, date)?;
        }

        let balance = statement.monthly_balances.get_or_placeholder(month);
        balance.closing_balance = amount;
        balance.statement_page = selection.page.max(DEFAULT_STATEMENT_PAGE);
        balance.highlight_coordinates = selection.coordinates;
        if selection.closing_date.is_some() {
            balance.closing_date = selection.closing_date;
        }
        balance.clear_verification();
        reopen(statement);
        Ok(amount)
    }

    pub fn update_balance(
        statement: &mut BankStatement,
        month: MonthKey,
        update: &BalanceUpdate,
    ) -> Result<(), CoreError> {
        if update.is_empty() {
            return Ok(());
        }
        if let Some(Some(date)) = update.closing_date {
            ensure_date_in_month(month, date)?;
        }
        let balance = statement
            .monthly_balances
            .get_mut(month)
            .ok_or(CoreError::MonthNotFound(month))?;
        if let Some(opening) = update.opening_balance {
            balance.opening_balance = opening;
        }
        if let Some(closing) = update.closing_balance {
            balance.closing_balance = closing;
        }
        if let Some(page) = update.statement_page {
            balance.statement_page = page.max(DEFAULT_STATEMENT_PAGE);
        }
        if let Some(date) = update.closing_date {
            balance.closing_date = date;
        }
        balance.clear_verification();
        reopen(statement);
        Ok(())
    }

    pub fn verify(
        statement: &mut BankStatement,
        month: MonthKey,
        verifier: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(CoreError::Validation("verifier name is required".into()));
        }
        let balance = statement
            .monthly_balances
            .get_mut(month)
            .ok_or(CoreError::MonthNotFound(month))?;
        balance.mark_verified(verifier, at);
        statement.touch();
        Ok(())
    }

    /// Points placeholder entries at the page where their month begins.
    /// Entries that carry user data keep their page. Returns how many changed.
    pub fn apply_page_hints(statement: &mut BankStatement, hints: &BTreeMap<MonthKey, u32>) -> usize {
        let mut changed = 0;
        for (month, page) in hints {
            if let Some(balance) = statement.monthly_balances.get_mut(*month) {
                if balance.is_placeholder() && balance.statement_page != *page {
                    balance.statement_page = *page;
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            statement.touch();
        }
        changed
    }
}

fn ensure_date_in_month(month: MonthKey, date: NaiveDate) -> Result<(), CoreError> {
    if month.contains(date) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "closing date {date} does not fall in {month}"
        )))
    }
}

// Any balance edit invalidates a filed statement.
fn reopen(statement: &mut BankStatement) {
    if statement.status != StatementStatus::Extracted {
        statement.status = StatementStatus::Extracted;
    }
    statement.touch();
}
