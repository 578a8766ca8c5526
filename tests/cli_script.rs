mod common;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const BIN_NAME: &str = "statement_recon_cli";

fn command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("STATEMENT_RECON_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("STATEMENT_RECON_CLI_SCRIPT");
    cmd
}

fn script_command(home: &TempDir) -> Command {
    let mut cmd = command(home);
    cmd.env("STATEMENT_RECON_CLI_SCRIPT", "1");
    cmd
}

#[test]
fn one_shot_parse_prints_the_period() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .args(["parse", "November 2023 - February 2024"])
        .assert()
        .success()
        .stdout(contains("Nov 2023 - Feb 2024").and(contains("4 months")));
}

#[test]
fn one_shot_months_lists_each_month() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .args(["months", "January", "-", "July", "2024"])
        .assert()
        .success()
        .stdout(contains("2024-01").and(contains("2024-07")).and(contains("Jul 2024")));
}

#[test]
fn one_shot_reconcile_reports_difference() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .args(["reconcile", "100.00", "100.02"])
        .assert()
        .success()
        .stdout(contains("Difference").and(contains("-0.02")));

    command(&home)
        .args(["reconcile", "100.00", "100.005"])
        .assert()
        .success()
        .stdout(contains("Reconciled"));
}

#[test]
fn missing_command_fails_with_usage() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .assert()
        .failure()
        .stderr(contains("missing command"));
}

#[test]
fn unknown_command_fails() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(contains("Unknown command `frobnicate`"));
}

#[test]
fn detect_reads_form_feed_pages() {
    let home = tempfile::tempdir().unwrap();
    let pages = home.path().join("statement.txt");
    std::fs::write(&pages, common::RENDERED_PAGES).unwrap();

    command(&home)
        .arg("detect")
        .arg(&pages)
        .assert()
        .success()
        .stdout(
            contains("Jan 2024 - Mar 2024")
                .and(contains("Feb 2024: page 2"))
                .and(contains("Closing balance 70000.00 on page 3")),
        );
}

#[test]
fn script_mode_runs_statement_flow() {
    let home = tempfile::tempdir().unwrap();
    let script = "\
# file a two-month statement
new equity acme 2 2024 \"January - February 2024\"
assign last 1 2024 \"KES 1,000.00\" 2
assign last 2 2024 \"KES 2,500.50\" 3
external last 1 2024 1000.004
external last 2 2024 2500.00 \"general ledger\"
verify last 1 2024 Wanjiku
verify last 2 2024 Wanjiku
finalize last
show last
check last
exit
list
";
    script_command(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(
            contains("Statement created")
                .and(contains("2 monthly balances synthesized"))
                .and(contains("Jan 2024 reconciled"))
                .and(contains("Feb 2024 differs by KES 0.50"))
                .and(contains("finalized"))
                .and(contains("yes (Wanjiku)"))
                .and(contains("1 month with differences"))
                .and(contains("No statements stored").not()),
        );

    let statements = home.path().join("statements");
    let stored: Vec<_> = std::fs::read_dir(&statements)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    assert_eq!(stored.len(), 1);
    let json = std::fs::read_to_string(stored[0].path()).unwrap();
    assert!(json.contains("\"Finalized\""));
    assert!(json.contains("\"KES\""));
}

#[test]
fn script_mode_reports_errors_and_continues() {
    let home = tempfile::tempdir().unwrap();
    let script = "\
new kcb acme 3 2024 \"March 2024\"
finalize last
assign last 13 2024 100
parse \"unterminated
version
";
    script_command(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stderr(
            contains("unverified months: Mar 2024")
                .and(contains("month must be a number from 1 to 12")),
        )
        .stdout(contains("could not read").and(contains("statement_recon")));
}

#[test]
fn script_mode_applies_scanned_text() {
    let home = tempfile::tempdir().unwrap();
    let pages = home.path().join("pages.txt");
    std::fs::write(&pages, common::RENDERED_PAGES).unwrap();

    let script = format!(
        "new ncba acme 3 2024\nscan last {}\nshow last\nbackup last before review\nbackups last\n",
        pages.display()
    );
    script_command(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(
            contains("Detected period Jan 2024 - Mar 2024 on page 1")
                .and(contains("2 page hint(s) applied"))
                .and(contains("Mar 2024"))
                .and(contains("_before-review.json")),
        );
}

#[test]
fn external_balance_without_statement_month_is_kept() {
    let home = tempfile::tempdir().unwrap();
    let script = "\
new absa acme 1 2024 \"January 2024\"
external last 5 2024 300.00
check last
";
    script_command(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("May 2024 recorded; no statement balance to reconcile"))
        .stdout(contains("external balance for May 2024 has no statement balance"))
        .stderr(contains("No monthly balance recorded").not());
}

#[test]
fn config_changes_are_saved_and_restorable() {
    let home = tempfile::tempdir().unwrap();
    let script = "\
config set reviewer Wanjiku
config backup with reviewer
config set currency US Dollars
config show
config backups
";
    script_command(&home)
        .write_stdin(script)
        .assert()
        .success()
        .stdout(
            contains("reviewer updated")
                .and(contains("Configuration backup created: config_"))
                .and(contains("currency:     USD"))
                .and(contains("_with-reviewer.json")),
        );

    let config_path = home.path().join("config").join("config.json");
    let saved = std::fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("\"USD\""));
    assert!(saved.contains("Wanjiku"));

    let backups = std::fs::read_dir(home.path().join("config").join("backups"))
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(backups.len(), 1);

    script_command(&home)
        .write_stdin(format!("config restore {}\nconfig show\n", backups[0]))
        .assert()
        .success()
        .stdout(contains("Configuration restored").and(contains("currency:     KES")));
}

#[test]
fn config_rejects_unknown_keys() {
    let home = tempfile::tempdir().unwrap();
    command(&home)
        .args(["config", "set", "theme", "dark"])
        .assert()
        .failure()
        .stderr(contains("keys are locale, currency"));
}
