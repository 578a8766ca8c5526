#![allow(dead_code)]

use std::sync::Mutex;

use once_cell::sync::Lazy;
use recon_storage_json::{JsonStatementStorage, StoragePaths};
use statement_recon::StatementManager;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a manager backed by its own JSON storage directory.
pub fn setup_manager() -> StatementManager {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let paths = StoragePaths {
        statement_root: base.join("statements"),
        backup_root: base.join("backups"),
    };
    let storage = JsonStatementStorage::with_retention(paths, 3).expect("create json storage");
    StatementManager::new(Box::new(storage))
}

/// Three rendered pages covering January to March 2024.
pub const RENDERED_PAGES: &str = "NCBA BANK KENYA PLC\n\
Statement Period: 01/01/2024 to 31/03/2024\n\
03/01/2024 Opening deposit 20,000.00\n\
\u{c}Page 2\n\
14/02/2024 Salary 80,000.00\n\
\u{c}Page 3\n\
02/03/2024 Rent (30,000.00)\n\
Closing Balance 70,000.00\n";
