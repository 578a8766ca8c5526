use std::collections::BTreeMap;

use chrono::Utc;
use recon_config::Config;
use recon_core::{
    balance_service::{BalanceService, BalanceUpdate, ClosingSelection, SyncOutcome},
    detect_period, find_labelled_balances, locate_month_pages, parse_period,
    reconciliation::ReconciliationService,
    statement_service::StatementService,
    storage::{statement_warnings, StatementBackupInfo, StatementStorage},
    BalanceHit, CoreError, DetectedPeriod,
};
use recon_domain::{BankStatement, MonthKey, MonthReconciliation, Reconciliation};
use recon_storage_json::{JsonStatementStorage, StoragePaths};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    currency::{normalize_currency, CurrencyCode},
    errors::ReconError,
};

/// What [`StatementManager::apply_detected_text`] found and changed.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub detected: Option<DetectedPeriod>,
    /// True when the detected period replaced a missing or unreadable one.
    pub period_updated: bool,
    pub added: Vec<MonthKey>,
    pub page_hints_applied: usize,
    pub labelled_balances: Vec<BalanceHit>,
}

/// Facade that coordinates statement edits, persistence and backups.
///
/// Every mutating call loads the stored statement, applies the change and
/// saves it back. A failed change leaves the stored record untouched.
pub struct StatementManager {
    storage: Box<dyn StatementStorage>,
    default_currency: CurrencyCode,
    reviewer: Option<String>,
}

impl StatementManager {
    pub fn new(storage: Box<dyn StatementStorage>) -> Self {
        Self {
            storage,
            default_currency: CurrencyCode::default(),
            reviewer: None,
        }
    }

    /// Builds a manager over JSON storage rooted where `config` points.
    pub fn from_config(config: &Config) -> Result<Self, ReconError> {
        let storage = JsonStatementStorage::with_retention(
            StoragePaths {
                statement_root: config.resolve_statement_root(),
                backup_root: config.resolve_backup_root(),
            },
            config.backup_retention,
        )?;
        let mut manager = Self::new(Box::new(storage));
        if let Some(code) = normalize_currency(&config.currency) {
            manager.default_currency = code;
        }
        manager.reviewer = config.reviewer_name().map(str::to_string);
        Ok(manager)
    }

    pub fn with_default_currency(mut self, code: CurrencyCode) -> Self {
        self.default_currency = code;
        self
    }

    pub fn with_reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(reviewer.into());
        self
    }

    pub fn storage(&self) -> &dyn StatementStorage {
        self.storage.as_ref()
    }

    pub fn default_currency(&self) -> &CurrencyCode {
        &self.default_currency
    }

    /// Files a new statement under `(bank_id, statement_month)`.
    ///
    /// Only one statement may exist per bank and month. The currency falls
    /// back to the configured default when absent or unrecognised.
    pub fn create_statement(
        &self,
        bank_id: &str,
        company_id: &str,
        statement_month: MonthKey,
        period: Option<&str>,
        currency: Option<&str>,
    ) -> Result<BankStatement, ReconError> {
        if let Some(existing) = self.storage.find_statement(bank_id, statement_month)? {
            return Err(CoreError::InvalidOperation(format!(
                "statement {} already filed for {} {}",
                existing.id,
                existing.bank_id,
                statement_month
            ))
            .into());
        }
        let (mut statement, outcome) =
            StatementService::create(bank_id, company_id, statement_month, period)?;
        let code = currency
            .and_then(normalize_currency)
            .unwrap_or_else(|| self.default_currency.clone());
        statement.currency = Some(code.to_string());
        self.storage.save_statement(&statement)?;
        info!(
            statement = %statement.id,
            bank = %statement.bank_id,
            months = outcome.added.len(),
            "statement created"
        );
        Ok(statement)
    }

    pub fn load(&self, id: Uuid) -> Result<BankStatement, ReconError> {
        Ok(self.storage.load_statement(id)?)
    }

    pub fn list(&self) -> Result<Vec<BankStatement>, ReconError> {
        Ok(self.storage.list_statements()?)
    }

    pub fn find_for_month(
        &self,
        bank_id: &str,
        month: MonthKey,
    ) -> Result<Option<BankStatement>, ReconError> {
        Ok(self.storage.find_statement(bank_id, month)?)
    }

    pub fn save(&self, statement: &BankStatement) -> Result<(), ReconError> {
        Ok(self.storage.save_statement(statement)?)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ReconError> {
        Ok(self.storage.delete_statement(id)?)
    }

    /// Replaces the period text and re-synthesizes balances. The last call wins.
    pub fn set_period(&self, id: Uuid, period: Option<&str>) -> Result<SyncOutcome, ReconError> {
        self.modify(id, |statement| {
            Ok(StatementService::set_period(
                statement,
                period.map(str::to_string),
            ))
        })
    }

    /// Runs period detection over rendered page text.
    ///
    /// A detected period is written only when the statement has none or its
    /// current one does not parse. Page hints then point placeholder months
    /// at the page where their transactions begin.
    pub fn apply_detected_text<S: AsRef<str>>(
        &self,
        id: Uuid,
        pages: &[S],
    ) -> Result<DetectionReport, ReconError> {
        self.modify(id, |statement| {
            let mut report = DetectionReport {
                detected: detect_period(pages),
                labelled_balances: find_labelled_balances(pages),
                ..DetectionReport::default()
            };
            let current = parse_period(statement.statement_period.as_deref());
            let period = match (current, report.detected.as_ref()) {
                (Some(period), _) => period,
                (None, Some(found)) => {
                    let outcome =
                        StatementService::set_period(statement, Some(found.period.to_string()));
                    report.period_updated = true;
                    report.added = outcome.added;
                    found.period
                }
                (None, None) => return Ok(report),
            };
            let hints: BTreeMap<MonthKey, u32> = locate_month_pages(pages, &period);
            report.page_hints_applied = BalanceService::apply_page_hints(statement, &hints);
            debug!(
                statement = %statement.id,
                hints = hints.len(),
                applied = report.page_hints_applied,
                "applied page hints"
            );
            Ok(report)
        })
    }

    pub fn assign_closing_balance(
        &self,
        id: Uuid,
        month: MonthKey,
        selection: &ClosingSelection,
    ) -> Result<Decimal, ReconError> {
        self.modify(id, |statement| {
            BalanceService::assign_closing_balance(statement, month, selection)
        })
    }

    pub fn update_balance(
        &self,
        id: Uuid,
        month: MonthKey,
        update: &BalanceUpdate,
    ) -> Result<(), ReconError> {
        self.modify(id, |statement| {
            BalanceService::update_balance(statement, month, update)
        })
    }

    /// Marks a month verified by `verifier`, or by the configured reviewer.
    pub fn verify_balance(
        &self,
        id: Uuid,
        month: MonthKey,
        verifier: Option<&str>,
    ) -> Result<(), ReconError> {
        let verifier = verifier
            .or(self.reviewer.as_deref())
            .ok_or_else(|| CoreError::Validation("verifier name is required".into()))?;
        self.modify(id, |statement| {
            BalanceService::verify(statement, month, verifier, Utc::now())
        })
    }

    pub fn record_external_balance(
        &self,
        id: Uuid,
        month: MonthKey,
        amount: Decimal,
        source: Option<&str>,
    ) -> Result<(), ReconError> {
        self.modify(id, |statement| {
            StatementService::record_external_balance(
                statement,
                month,
                amount,
                source.map(str::to_string),
            );
            Ok(())
        })
    }

    /// Reconciles one month against `external_balance`, or against the
    /// figure recorded for that month when none is given.
    pub fn reconcile_month(
        &self,
        id: Uuid,
        month: MonthKey,
        external_balance: Option<Decimal>,
    ) -> Result<Reconciliation, ReconError> {
        let statement = self.storage.load_statement(id)?;
        let external = external_balance
            .or_else(|| statement.external_balance(month))
            .ok_or_else(|| {
                CoreError::Validation(format!("no external balance recorded for {month}"))
            })?;
        Ok(ReconciliationService::reconcile_month(
            &statement, month, external,
        )?)
    }

    pub fn reconcile_all(&self, id: Uuid) -> Result<Vec<MonthReconciliation>, ReconError> {
        let statement = self.storage.load_statement(id)?;
        Ok(ReconciliationService::reconcile_statement(&statement))
    }

    pub fn warnings(&self, id: Uuid) -> Result<Vec<String>, ReconError> {
        let statement = self.storage.load_statement(id)?;
        Ok(statement_warnings(&statement))
    }

    pub fn finalize(&self, id: Uuid) -> Result<BankStatement, ReconError> {
        self.modify(id, |statement| {
            StatementService::finalize(statement)?;
            Ok(statement.clone())
        })
    }

    pub fn backup(&self, id: Uuid, note: Option<&str>) -> Result<StatementBackupInfo, ReconError> {
        let statement = self.storage.load_statement(id)?;
        Ok(self.storage.backup_statement(&statement, note)?)
    }

    pub fn list_backups(&self, id: Uuid) -> Result<Vec<StatementBackupInfo>, ReconError> {
        Ok(self.storage.list_backups(id)?)
    }

    /// Restores the backup named `backup_id` over the current record.
    pub fn restore_backup(&self, id: Uuid, backup_id: &str) -> Result<BankStatement, ReconError> {
        let backup = self
            .storage
            .list_backups(id)?
            .into_iter()
            .find(|info| info.id == backup_id)
            .ok_or_else(|| CoreError::Storage(format!("backup `{backup_id}` not found")))?;
        Ok(self.storage.restore_backup(&backup)?)
    }

    fn modify<T>(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut BankStatement) -> Result<T, CoreError>,
    ) -> Result<T, ReconError> {
        let mut statement = self.storage.load_statement(id)?;
        let result = change(&mut statement)?;
        self.storage.save_statement(&statement)?;
        Ok(result)
    }
}
