//! recon-storage-json
//!
//! Filesystem-backed JSON persistence for bank statements and their backups.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use recon_core::{
    storage::{StatementBackupInfo, StatementStorage},
    CoreError,
};
use recon_domain::{BankStatement, MonthKey};
use tracing::{info, warn};
use uuid::Uuid;

const FILE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Directories used by [`JsonStatementStorage`].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub statement_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Stores each statement as `<id>.json` and keeps per-statement backup folders.
#[derive(Debug, Clone)]
pub struct JsonStatementStorage {
    statements_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStatementStorage {
    pub fn new(paths: StoragePaths) -> Result<Self, CoreError> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.statement_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            statements_dir: paths.statement_root,
            backups_dir: paths.backup_root,
            retention: retention.max(1),
        })
    }

    pub fn statement_path(&self, id: Uuid) -> PathBuf {
        self.statements_dir.join(format!("{id}.{FILE_EXTENSION}"))
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    fn backup_dir(&self, id: Uuid) -> PathBuf {
        self.backups_dir.join(id.to_string())
    }

    fn next_sequence(&self, id: Uuid) -> Result<u32, CoreError> {
        let last = self
            .list_backups(id)?
            .iter()
            .filter_map(|info| backup_sequence(&info.id))
            .max()
            .unwrap_or(0);
        Ok(last + 1)
    }

    fn write_backup(
        &self,
        id: Uuid,
        contents: &str,
        note: Option<&str>,
    ) -> Result<StatementBackupInfo, CoreError> {
        let dir = self.backup_dir(id);
        fs::create_dir_all(&dir)?;
        let sequence = self.next_sequence(id)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{sequence:04}_{timestamp}");
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let file_name = format!("{stem}.{FILE_EXTENSION}");
        let path = dir.join(&file_name);
        write_file(&path, contents)?;
        self.prune_backups(id)?;
        Ok(StatementBackupInfo {
            statement_id: id,
            id: file_name,
            created_at: timestamp,
            path,
        })
    }

    fn prune_backups(&self, id: Uuid) -> Result<(), CoreError> {
        for entry in self.list_backups(id)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, error = %err, "failed to prune statement backup");
            }
        }
        Ok(())
    }
}

impl StatementStorage for JsonStatementStorage {
    fn save_statement(&self, statement: &BankStatement) -> Result<(), CoreError> {
        let path = self.statement_path(statement.id);
        if path.exists() {
            let previous = fs::read_to_string(&path)?;
            self.write_backup(statement.id, &previous, None)?;
        }
        save_statement_to_path(statement, &path)?;
        info!(statement = %statement.id, path = %path.display(), "statement saved");
        Ok(())
    }

    fn load_statement(&self, id: Uuid) -> Result<BankStatement, CoreError> {
        let path = self.statement_path(id);
        if !path.exists() {
            return Err(CoreError::StatementNotFound(id.to_string()));
        }
        load_statement_from_path(&path)
    }

    fn find_statement(
        &self,
        bank_id: &str,
        month: MonthKey,
    ) -> Result<Option<BankStatement>, CoreError> {
        let bank_id = bank_id.trim();
        Ok(self.list_statements()?.into_iter().find(|statement| {
            statement.bank_id.eq_ignore_ascii_case(bank_id) && statement.statement_month == month
        }))
    }

    fn list_statements(&self) -> Result<Vec<BankStatement>, CoreError> {
        if !self.statements_dir.exists() {
            return Ok(Vec::new());
        }
        let mut statements = Vec::new();
        for entry in fs::read_dir(&self.statements_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            statements.push(load_statement_from_path(&path)?);
        }
        statements.sort_by(|a, b| {
            (&a.company_id, &a.bank_id, a.statement_month)
                .cmp(&(&b.company_id, &b.bank_id, b.statement_month))
        });
        Ok(statements)
    }

    fn delete_statement(&self, id: Uuid) -> Result<(), CoreError> {
        let path = self.statement_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn backup_statement(
        &self,
        statement: &BankStatement,
        note: Option<&str>,
    ) -> Result<StatementBackupInfo, CoreError> {
        self.write_backup(statement.id, &serialize_statement(statement)?, note)
    }

    /// Newest first.
    fn list_backups(&self, id: Uuid) -> Result<Vec<StatementBackupInfo>, CoreError> {
        let dir = self.backup_dir(id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if backup_sequence(file_name).is_none() {
                continue;
            }
            let created_at = parse_backup_timestamp(file_name)
                .map(|at| at.to_rfc3339())
                .unwrap_or_default();
            entries.push(StatementBackupInfo {
                statement_id: id,
                id: file_name.to_string(),
                created_at,
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| Reverse(backup_sequence(&info.id)));
        Ok(entries)
    }

    fn restore_backup(&self, backup: &StatementBackupInfo) -> Result<BankStatement, CoreError> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let restored = load_statement_from_path(&backup.path)?;
        if restored.id != backup.statement_id {
            return Err(CoreError::Storage(format!(
                "backup `{}` belongs to statement {}",
                backup.id, restored.id
            )));
        }
        save_statement_to_path(&restored, &self.statement_path(restored.id))?;
        info!(statement = %restored.id, backup = %backup.id, "statement restored from backup");
        Ok(restored)
    }
}

/// Saves a statement to an arbitrary path on disk.
pub fn save_statement_to_path(statement: &BankStatement, path: &Path) -> Result<(), CoreError> {
    let tmp = tmp_path(path);
    write_file(&tmp, &serialize_statement(statement)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a statement from the provided filesystem path.
///
/// Repeated months in `monthly_balances` collapse to their first entry.
pub fn load_statement_from_path(path: &Path) -> Result<BankStatement, CoreError> {
    let data = fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    let stored_entries = value
        .get("monthly_balances")
        .and_then(|balances| balances.as_array())
        .map_or(0, Vec::len);
    let statement: BankStatement =
        serde_json::from_value(value).map_err(|err| CoreError::Serde(err.to_string()))?;
    if stored_entries > statement.monthly_balances.len() {
        warn!(
            statement = %statement.id,
            dropped = stored_entries - statement.monthly_balances.len(),
            "duplicate monthly balances collapsed on load"
        );
    }
    Ok(statement)
}

fn serialize_statement(statement: &BankStatement) -> Result<String, CoreError> {
    serde_json::to_string_pretty(statement).map_err(|err| CoreError::Serde(err.to_string()))
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// Backup names look like `0003_20240131_174502[_note].json`. The sequence is
// zero-padded to four digits and grows wider past 9999.
fn backup_sequence(name: &str) -> Option<u32> {
    let head = name.split('_').next()?;
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{FILE_EXTENSION}"))?;
    let mut segments = stem.split('_').skip(1);
    let date = segments.next()?;
    let time = segments.next()?;
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_carry_sequence_and_timestamp() {
        let name = "0012_20240229_081500_month-end.json";
        assert_eq!(backup_sequence(name), Some(12));
        let at = parse_backup_timestamp(name).unwrap();
        assert_eq!(at.to_rfc3339(), "2024-02-29T08:15:00+00:00");
        assert_eq!(backup_sequence("notes.json"), None);
    }

    #[test]
    fn sequences_past_four_digits_are_read() {
        assert_eq!(backup_sequence("10000_20240301_090000.json"), Some(10000));
        assert_eq!(backup_sequence("123456_20240301_090000_note.json"), Some(123456));
        assert_eq!(backup_sequence("_20240301_090000.json"), None);
    }

    #[test]
    fn notes_are_slugged() {
        assert_eq!(
            sanitize_backup_note(Some("Before Jan edits")),
            Some("before-jan-edits".into())
        );
        assert_eq!(sanitize_backup_note(Some("   ")), None);
    }
}
