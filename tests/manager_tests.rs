mod common;

use std::str::FromStr;

use common::{setup_manager, RENDERED_PAGES};
use recon_core::{
    balance_service::{BalanceUpdate, ClosingSelection},
    split_pages, CoreError,
};
use recon_domain::{MonthKey, ReconciliationStatus, StatementStatus};
use rust_decimal::Decimal;
use statement_recon::ReconError;

fn key(month: u32, year: i32) -> MonthKey {
    MonthKey::new(month, year).unwrap()
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn selection(text: &str) -> ClosingSelection {
    ClosingSelection {
        text: text.to_string(),
        page: 2,
        coordinates: None,
        closing_date: None,
    }
}

#[test]
fn created_statement_is_persisted_with_placeholders() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("equity", "acme", key(6, 2024), Some("January - July 2024"), Some("Kshs."))
        .expect("create");

    assert_eq!(statement.currency.as_deref(), Some("KES"));
    let stored = manager.load(statement.id).expect("load");
    assert_eq!(stored.monthly_balances.len(), 7);
    assert_eq!(stored.status, StatementStatus::Extracted);

    let found = manager
        .find_for_month("equity", key(6, 2024))
        .expect("find")
        .expect("present");
    assert_eq!(found.id, statement.id);
}

#[test]
fn one_statement_per_bank_and_month() {
    let manager = setup_manager();
    manager
        .create_statement("kcb", "acme", key(0, 2024), None, None)
        .expect("create");

    let err = manager
        .create_statement("kcb", "other", key(0, 2024), None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ReconError::Core(CoreError::InvalidOperation(_))
    ));

    manager
        .create_statement("kcb", "acme", key(1, 2024), None, None)
        .expect("next month is free");
}

#[test]
fn set_period_resynthesizes_and_keeps_values() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("absa", "acme", key(1, 2024), Some("Jan - Feb 2024"), None)
        .expect("create");
    manager
        .assign_closing_balance(statement.id, key(0, 2024), &selection("KES 4,000.00"))
        .expect("assign");

    let outcome = manager
        .set_period(statement.id, Some("January - April 2024"))
        .expect("set period");
    assert_eq!(outcome.added, vec![key(2, 2024), key(3, 2024)]);

    let stored = manager.load(statement.id).expect("load");
    assert_eq!(stored.monthly_balances.len(), 4);
    assert_eq!(
        stored.monthly_balances.get(key(0, 2024)).unwrap().closing_balance,
        dec("4000.00")
    );
}

#[test]
fn detected_text_fills_missing_period_and_page_hints() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("ncba", "acme", key(2, 2024), None, None)
        .expect("create");
    assert!(statement.monthly_balances.is_empty());

    let pages = split_pages(RENDERED_PAGES);
    let report = manager
        .apply_detected_text(statement.id, &pages)
        .expect("apply text");
    assert!(report.period_updated);
    assert_eq!(report.added.len(), 3);
    assert_eq!(report.page_hints_applied, 2);
    assert_eq!(report.labelled_balances.len(), 1);

    let stored = manager.load(statement.id).expect("load");
    assert_eq!(stored.statement_period.as_deref(), Some("Jan 2024 - Mar 2024"));
    assert_eq!(stored.monthly_balances.get(key(1, 2024)).unwrap().statement_page, 2);
    assert_eq!(stored.monthly_balances.get(key(2, 2024)).unwrap().statement_page, 3);
}

#[test]
fn detected_text_keeps_an_existing_period() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("ncba", "acme", key(1, 2024), Some("February 2024"), None)
        .expect("create");

    let pages = split_pages(RENDERED_PAGES);
    let report = manager
        .apply_detected_text(statement.id, &pages)
        .expect("apply text");
    assert!(report.detected.is_some());
    assert!(!report.period_updated);

    let stored = manager.load(statement.id).expect("load");
    assert_eq!(stored.statement_period.as_deref(), Some("February 2024"));
    assert_eq!(stored.monthly_balances.len(), 1);
    assert_eq!(stored.monthly_balances.get(key(1, 2024)).unwrap().statement_page, 2);
}

#[test]
fn failed_edits_leave_the_record_untouched() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("dtb", "acme", key(0, 2024), Some("January 2024"), None)
        .expect("create");
    let before = manager.load(statement.id).expect("load");

    let err = manager
        .assign_closing_balance(statement.id, key(0, 2024), &selection("no digits here"))
        .unwrap_err();
    assert!(matches!(err, ReconError::Core(CoreError::InvalidAmount(_))));

    let err = manager
        .update_balance(
            statement.id,
            key(5, 2024),
            &BalanceUpdate {
                closing_balance: Some(Decimal::ONE),
                ..BalanceUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ReconError::Core(CoreError::MonthNotFound(_))));

    let after = manager.load(statement.id).expect("load");
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.monthly_balances, before.monthly_balances);
}

#[test]
fn verification_finalization_and_reopening() {
    let manager = setup_manager().with_reviewer("Achieng");
    let statement = manager
        .create_statement("coop", "acme", key(1, 2024), Some("Jan - Feb 2024"), None)
        .expect("create");

    manager
        .verify_balance(statement.id, key(0, 2024), None)
        .expect("verify with reviewer");
    let err = manager.finalize(statement.id).unwrap_err();
    assert!(matches!(err, ReconError::Core(CoreError::Validation(_))));

    manager
        .verify_balance(statement.id, key(1, 2024), Some("Otieno"))
        .expect("verify");
    let finalized = manager.finalize(statement.id).expect("finalize");
    assert_eq!(finalized.status, StatementStatus::Finalized);
    let january = finalized.monthly_balances.get(key(0, 2024)).unwrap();
    assert_eq!(january.verified_by.as_deref(), Some("Achieng"));

    manager
        .assign_closing_balance(statement.id, key(1, 2024), &selection("(250.00)"))
        .expect("assign");
    let stored = manager.load(statement.id).expect("load");
    assert_eq!(stored.status, StatementStatus::Extracted);
    let february = stored.monthly_balances.get(key(1, 2024)).unwrap();
    assert_eq!(february.closing_balance, dec("-250.00"));
    assert!(!february.is_verified);
}

#[test]
fn verification_needs_a_name() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("coop", "acme", key(1, 2024), Some("Feb 2024"), None)
        .expect("create");
    let err = manager
        .verify_balance(statement.id, key(1, 2024), None)
        .unwrap_err();
    assert!(matches!(err, ReconError::Core(CoreError::Validation(_))));
}

#[test]
fn reconciles_against_recorded_external_balances() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("stanbic", "acme", key(1, 2024), Some("Jan - Feb 2024"), None)
        .expect("create");
    manager
        .assign_closing_balance(statement.id, key(0, 2024), &selection("100.00"))
        .expect("assign jan");
    manager
        .assign_closing_balance(statement.id, key(1, 2024), &selection("100.00"))
        .expect("assign feb");
    manager
        .record_external_balance(statement.id, key(0, 2024), dec("100.005"), Some("ledger"))
        .expect("external jan");
    manager
        .record_external_balance(statement.id, key(1, 2024), dec("100.02"), None)
        .expect("external feb");

    let january = manager
        .reconcile_month(statement.id, key(0, 2024), None)
        .expect("reconcile jan");
    assert_eq!(january.status, ReconciliationStatus::Reconciled);

    let adhoc = manager
        .reconcile_month(statement.id, key(0, 2024), Some(dec("90")))
        .expect("reconcile ad hoc");
    assert_eq!(adhoc.delta, dec("10.00"));

    let rows = manager.reconcile_all(statement.id).expect("reconcile all");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].outcome.status, ReconciliationStatus::Difference);
    assert_eq!(rows[1].outcome.delta, dec("-0.02"));

    let missing = manager.reconcile_month(statement.id, key(5, 2024), Some(Decimal::ZERO));
    assert!(matches!(
        missing,
        Err(ReconError::Core(CoreError::MonthNotFound(_)))
    ));
}

#[test]
fn backups_restore_earlier_state() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("equity", "acme", key(0, 2024), Some("January 2024"), None)
        .expect("create");
    let backup = manager
        .backup(statement.id, Some("before edits"))
        .expect("backup");

    manager
        .set_period(statement.id, Some("January - March 2024"))
        .expect("set period");
    assert_eq!(manager.load(statement.id).unwrap().monthly_balances.len(), 3);

    let listed = manager.list_backups(statement.id).expect("list");
    assert!(listed.iter().any(|info| info.id == backup.id));

    let restored = manager
        .restore_backup(statement.id, &backup.id)
        .expect("restore");
    assert_eq!(restored.monthly_balances.len(), 1);
    assert_eq!(manager.load(statement.id).unwrap().monthly_balances.len(), 1);

    assert!(manager.restore_backup(statement.id, "0999_missing.json").is_err());
}

#[test]
fn warnings_surface_months_outside_the_period() {
    let manager = setup_manager();
    let statement = manager
        .create_statement("equity", "acme", key(2, 2024), Some("January - March 2024"), None)
        .expect("create");
    manager
        .set_period(statement.id, Some("March 2024"))
        .expect("narrow period");

    let warnings = manager.warnings(statement.id).expect("warnings");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|warning| warning.contains("outside")));
}
