use std::{fs, str::FromStr};

use recon_core::{storage::StatementStorage, CoreError};
use recon_domain::{BankStatement, MonthKey, MonthlyBalance};
use recon_storage_json::{JsonStatementStorage, StoragePaths};
use rust_decimal::Decimal;
use tempfile::tempdir;
use uuid::Uuid;

fn storage_in(dir: &std::path::Path, retention: usize) -> (JsonStatementStorage, StoragePaths) {
    let paths = StoragePaths {
        statement_root: dir.join("statements"),
        backup_root: dir.join("backups"),
    };
    let storage =
        JsonStatementStorage::with_retention(paths.clone(), retention).expect("create storage");
    (storage, paths)
}

fn sample_statement(bank: &str, month: u32) -> BankStatement {
    let key = MonthKey::new(month, 2024).expect("month");
    let mut statement =
        BankStatement::new(bank, "acme-ltd", key).with_period("January - March 2024");
    let balance = statement.monthly_balances.get_or_placeholder(key);
    balance.closing_balance = Decimal::from_str("10500.25").unwrap();
    statement
}

#[test]
fn json_storage_can_save_and_load_statement() {
    let dir = tempdir().expect("tempdir");
    let (storage, paths) = storage_in(dir.path(), 5);

    let statement = sample_statement("equity", 2);
    storage.save_statement(&statement).expect("save statement");

    let path = storage.statement_path(statement.id);
    assert_eq!(path.parent(), Some(paths.statement_root.as_path()));
    assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("json"));
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = storage.load_statement(statement.id).expect("load statement");
    assert_eq!(loaded.id, statement.id);
    assert_eq!(loaded.statement_period.as_deref(), Some("January - March 2024"));
    assert_eq!(loaded.monthly_balances, statement.monthly_balances);
}

#[test]
fn loading_unknown_statement_fails() {
    let dir = tempdir().expect("tempdir");
    let (storage, _) = storage_in(dir.path(), 5);

    let err = storage.load_statement(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, CoreError::StatementNotFound(_)));
}

#[test]
fn statements_are_found_by_bank_and_month() {
    let dir = tempdir().expect("tempdir");
    let (storage, _) = storage_in(dir.path(), 5);

    let march = sample_statement("equity", 2);
    let april = sample_statement("equity", 3);
    let other_bank = sample_statement("kcb", 2);
    for statement in [&march, &april, &other_bank] {
        storage.save_statement(statement).expect("save");
    }

    let found = storage
        .find_statement("Equity", MonthKey::new(2, 2024).unwrap())
        .expect("find")
        .expect("statement present");
    assert_eq!(found.id, march.id);

    let missing = storage
        .find_statement("ncba", MonthKey::new(2, 2024).unwrap())
        .expect("find");
    assert!(missing.is_none());

    assert_eq!(storage.list_statements().expect("list").len(), 3);

    storage.delete_statement(april.id).expect("delete");
    assert_eq!(storage.list_statements().expect("list").len(), 2);
}

#[test]
fn json_storage_creates_and_restores_backups() {
    let dir = tempdir().expect("tempdir");
    let (storage, paths) = storage_in(dir.path(), 5);

    let mut statement = sample_statement("equity", 0);
    storage.save_statement(&statement).expect("save statement");
    let info = storage
        .backup_statement(&statement, Some("Before review"))
        .expect("create backup");
    assert!(info.id.ends_with("_before-review.json"));
    assert_eq!(
        info.path.parent().map(|parent| parent.to_path_buf()),
        Some(paths.backup_root.join(statement.id.to_string()))
    );

    statement.statement_period = Some("February 2024".into());
    storage.save_statement(&statement).expect("overwrite statement");

    let backups = storage.list_backups(statement.id).expect("list backups");
    assert_eq!(backups.len(), 2, "explicit backup plus the overwritten file");
    assert!(backups.iter().any(|entry| entry.id == info.id));
    assert_ne!(backups[0].id, info.id, "newest backup comes first");

    let restored = storage.restore_backup(&info).expect("restore backup");
    assert_eq!(restored.statement_period.as_deref(), Some("January - March 2024"));
    let reloaded = storage.load_statement(statement.id).expect("reload");
    assert_eq!(reloaded.statement_period.as_deref(), Some("January - March 2024"));
}

#[test]
fn backups_are_pruned_to_retention() {
    let dir = tempdir().expect("tempdir");
    let (storage, _) = storage_in(dir.path(), 2);

    let statement = sample_statement("absa", 4);
    for note in ["one", "two", "three", "four"] {
        storage
            .backup_statement(&statement, Some(note))
            .expect("backup");
    }

    let backups = storage.list_backups(statement.id).expect("list backups");
    let ids: Vec<&str> = backups.iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0].starts_with("0004_") && ids[0].ends_with("_four.json"));
    assert!(ids[1].starts_with("0003_") && ids[1].ends_with("_three.json"));
}

#[test]
fn duplicate_months_collapse_on_load() {
    let dir = tempdir().expect("tempdir");
    let (storage, _) = storage_in(dir.path(), 5);

    let statement = sample_statement("coop", 2);
    let key = MonthKey::new(2, 2024).unwrap();
    let mut value = serde_json::to_value(&statement).expect("serialize");
    let mut duplicate = MonthlyBalance::placeholder(key);
    duplicate.closing_balance = Decimal::from(99);
    value["monthly_balances"]
        .as_array_mut()
        .expect("array")
        .push(serde_json::to_value(&duplicate).expect("serialize balance"));
    fs::write(
        storage.statement_path(statement.id),
        serde_json::to_string_pretty(&value).expect("render"),
    )
    .expect("write");

    let loaded = storage.load_statement(statement.id).expect("load");
    assert_eq!(loaded.monthly_balances.len(), 1);
    assert_eq!(
        loaded.monthly_balances.get(key).unwrap().closing_balance,
        Decimal::from_str("10500.25").unwrap()
    );
}

#[test]
fn backup_sequence_keeps_counting_past_9999() {
    let dir = tempdir().expect("tempdir");
    let (storage, paths) = storage_in(dir.path(), 5);
    let statement = sample_statement("kcb", 0);
    storage.save_statement(&statement).expect("save statement");

    let backup_dir = paths.backup_root.join(statement.id.to_string());
    fs::create_dir_all(&backup_dir).expect("backup dir");
    let json = fs::read_to_string(storage.statement_path(statement.id)).expect("read");
    fs::write(backup_dir.join("9999_20240101_000000.json"), &json).expect("seed backup");

    let first = storage.backup_statement(&statement, None).expect("backup");
    assert!(first.id.starts_with("10000_"), "{}", first.id);
    let second = storage.backup_statement(&statement, None).expect("backup");
    assert!(second.id.starts_with("10001_"), "{}", second.id);

    let backups = storage.list_backups(statement.id).expect("list backups");
    assert_eq!(backups[0].id, second.id);
    assert_eq!(backups.len(), 3);
}
