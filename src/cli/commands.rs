use std::{fs, str::FromStr};

use recon_core::{
    balance_service::ClosingSelection, enumerate_months, parse_amount, parse_period_str,
    reconcile, split_pages, BalanceKind, CoreError,
};
use recon_domain::{BankStatement, MonthKey, MonthReconciliation, ReconciliationStatus};
use recon_config::Config;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{output, CliContext, LoopControl};
use crate::{
    currency::{format_amount, normalize_currency, CurrencyCode, FormatOptions, LocaleConfig},
    errors::{CliError, ReconError},
    utils::build_info,
};

const HELP: &[(&str, &str)] = &[
    ("parse <text>", "Parse a statement period string"),
    ("months <text>", "List the months a period covers"),
    ("reconcile <statement> <external>", "Compare two balances"),
    ("detect <pages-file>", "Find the period in rendered statement text"),
    (
        "new <bank> <company> <month> <year> [period]",
        "File a statement and synthesize its monthly balances",
    ),
    ("show <id>", "Show a statement and its balances"),
    ("set-period <id> <text>", "Replace the statement period"),
    ("scan <id> <pages-file>", "Apply detected period and page hints"),
    (
        "assign <id> <month> <year> <amount-text> [page]",
        "Assign a closing balance from selected text",
    ),
    ("verify <id> <month> <year> [user]", "Mark a monthly balance verified"),
    (
        "external <id> <month> <year> <amount> [source]",
        "Record the bookkeeping balance for a month",
    ),
    ("check <id>", "Reconcile every month and list warnings"),
    ("finalize <id>", "Finalize a fully verified statement"),
    ("list", "List stored statements"),
    ("backup <id> [note]", "Back up a statement"),
    ("backups <id>", "List backups of a statement"),
    ("restore <id> <backup>", "Restore a statement backup"),
    (
        "config [show|set <key> <value>|backup [note]|backups|restore <name>]",
        "View and manage preferences",
    ),
    ("version", "Show build information"),
    ("help", "Show this help"),
    ("exit", "Stop a script"),
];

/// Prints the command list.
pub fn print_help() {
    output::section("Commands");
    for (usage, summary) in HELP {
        output::line(format!("  {usage:<48} {summary}"));
    }
    output::line("Months are 1-12. `<id>` accepts a full id, a unique prefix or `last`.");
}

/// Runs one tokenized command.
pub fn dispatch(context: &mut CliContext, tokens: &[String]) -> Result<LoopControl, CliError> {
    let Some((command, args)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match command.to_ascii_lowercase().as_str() {
        "parse" => cmd_parse(&args)?,
        "months" => cmd_months(&args)?,
        "reconcile" => cmd_reconcile(context, &args)?,
        "detect" => cmd_detect(&args)?,
        "new" => cmd_new(context, &args)?,
        "show" => cmd_show(context, &args)?,
        "set-period" => cmd_set_period(context, &args)?,
        "scan" => cmd_scan(context, &args)?,
        "assign" => cmd_assign(context, &args)?,
        "verify" => cmd_verify(context, &args)?,
        "external" => cmd_external(context, &args)?,
        "check" => cmd_check(context, &args)?,
        "finalize" => cmd_finalize(context, &args)?,
        "list" => cmd_list(context)?,
        "backup" => cmd_backup(context, &args)?,
        "backups" => cmd_backups(context, &args)?,
        "restore" => cmd_restore(context, &args)?,
        "config" => cmd_config(context, &args)?,
        "version" => output::line(build_info::current().summary()),
        "help" => print_help(),
        "exit" | "quit" => return Ok(LoopControl::Exit),
        other => return Err(CliError::UnknownCommand(other.to_string())),
    }
    Ok(LoopControl::Continue)
}

fn cmd_parse(args: &[&str]) -> Result<(), CliError> {
    let text = joined(args, "parse <text>")?;
    match parse_period_str(&text) {
        Some(period) => output::success(format!(
            "Period: {period} ({} month{})",
            period.month_count(),
            plural(period.month_count())
        )),
        None => output::warning(format!("No statement period recognised in `{text}`")),
    }
    Ok(())
}

fn cmd_months(args: &[&str]) -> Result<(), CliError> {
    let text = joined(args, "months <text>")?;
    let Some(period) = parse_period_str(&text) else {
        output::warning(format!("No statement period recognised in `{text}`"));
        return Ok(());
    };
    for month in enumerate_months(&period) {
        output::line(format!("{}-{:02}  {month}", month.year(), month.month() + 1));
    }
    Ok(())
}

fn cmd_reconcile(context: &CliContext, args: &[&str]) -> Result<(), CliError> {
    let [statement, external] = args else {
        return Err(usage("reconcile <statement> <external>"));
    };
    let statement = amount_arg(statement)?;
    let external = amount_arg(external)?;
    let outcome = reconcile(statement, external);
    let code = default_code(context);
    let delta = money(context, outcome.delta, &code);
    match outcome.status {
        ReconciliationStatus::Reconciled => {
            output::success(format!("Reconciled (delta {delta})"))
        }
        ReconciliationStatus::Difference => output::warning(format!("Difference: {delta}")),
    }
    Ok(())
}

fn cmd_detect(args: &[&str]) -> Result<(), CliError> {
    let [path] = args else {
        return Err(usage("detect <pages-file>"));
    };
    let pages = split_pages(&fs::read_to_string(path)?);
    let Some(detected) = recon_core::detect_period(&pages) else {
        output::warning(format!("No statement period found in {} page(s)", pages.len()));
        return Ok(());
    };
    output::success(format!(
        "Period: {} (page {}: \"{}\")",
        detected.period, detected.page, detected.line
    ));
    let hints = recon_core::locate_month_pages(&pages, &detected.period);
    for month in enumerate_months(&detected.period) {
        match hints.get(&month) {
            Some(page) => output::line(format!("  {month}: page {page}")),
            None => output::line(format!("  {month}: no dated lines")),
        }
    }
    for hit in recon_core::find_labelled_balances(&pages) {
        let label = match hit.kind {
            BalanceKind::Opening => "Opening",
            BalanceKind::Closing => "Closing",
        };
        output::line(format!("  {label} balance {} on page {}", hit.amount, hit.page));
    }
    Ok(())
}

fn cmd_new(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "new <bank> <company> <month> <year> [period]";
    if args.len() < 4 {
        return Err(usage(USAGE));
    }
    let month = month_arg(args[2], args[3])?;
    let period = (args.len() > 4).then(|| args[4..].join(" "));
    let statement = context.manager.create_statement(
        args[0],
        args[1],
        month,
        period.as_deref(),
        None,
    )?;
    context.last_statement = Some(statement.id);
    output::success(format!("Statement created: {}", statement.id));
    if statement.monthly_balances.is_empty() {
        if let Some(text) = period {
            output::warning(format!("Could not parse period `{text}`; no months added"));
        }
    } else {
        output::info(format!(
            "{} monthly balance{} synthesized",
            statement.monthly_balances.len(),
            plural(statement.monthly_balances.len())
        ));
    }
    Ok(())
}

fn cmd_show(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id] = args else {
        return Err(usage("show <id>"));
    };
    let id = resolve_id(context, id)?;
    let statement = context.manager.load(id)?;
    render_statement(context, &statement);
    Ok(())
}

fn cmd_set_period(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "set-period <id> <text>";
    let Some((id, rest)) = args.split_first() else {
        return Err(usage(USAGE));
    };
    let id = resolve_id(context, id)?;
    let text = joined(rest, USAGE)?;
    let outcome = context.manager.set_period(id, Some(&text))?;
    match outcome.period {
        Some(period) => output::success(format!(
            "Period set to {period}; {} month{} added",
            outcome.added.len(),
            plural(outcome.added.len())
        )),
        None => output::warning(format!("Period `{text}` saved but not recognised")),
    }
    Ok(())
}

fn cmd_scan(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id, path] = args else {
        return Err(usage("scan <id> <pages-file>"));
    };
    let id = resolve_id(context, id)?;
    let pages = split_pages(&fs::read_to_string(path)?);
    let report = context.manager.apply_detected_text(id, &pages)?;
    match &report.detected {
        Some(found) if report.period_updated => output::success(format!(
            "Detected period {} on page {}; {} month{} added",
            found.period,
            found.page,
            report.added.len(),
            plural(report.added.len())
        )),
        Some(found) => output::info(format!("Detected period {} (kept existing)", found.period)),
        None => output::warning("No statement period detected"),
    }
    output::info(format!("{} page hint(s) applied", report.page_hints_applied));
    Ok(())
}

fn cmd_assign(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "assign <id> <month> <year> <amount-text> [page]";
    if !(4..=5).contains(&args.len()) {
        return Err(usage(USAGE));
    }
    let id = resolve_id(context, args[0])?;
    let month = month_arg(args[1], args[2])?;
    let page = match args.get(4) {
        Some(raw) => raw.parse::<u32>().map_err(|_| invalid(raw, "page must be a number"))?,
        None => 1,
    };
    let selection = ClosingSelection {
        text: args[3].to_string(),
        page,
        coordinates: None,
        closing_date: None,
    };
    let amount = context
        .manager
        .assign_closing_balance(id, month, &selection)?;
    let code = statement_code(context, id)?;
    output::success(format!(
        "Closing balance for {month} set to {}",
        money(context, amount, &code)
    ));
    Ok(())
}

fn cmd_verify(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "verify <id> <month> <year> [user]";
    if !(3..=4).contains(&args.len()) {
        return Err(usage(USAGE));
    }
    let id = resolve_id(context, args[0])?;
    let month = month_arg(args[1], args[2])?;
    context
        .manager
        .verify_balance(id, month, args.get(3).copied())?;
    output::success(format!("{month} verified"));
    Ok(())
}

fn cmd_external(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "external <id> <month> <year> <amount> [source]";
    if args.len() < 4 {
        return Err(usage(USAGE));
    }
    let id = resolve_id(context, args[0])?;
    let month = month_arg(args[1], args[2])?;
    let amount = amount_arg(args[3])?;
    let source = (args.len() > 4).then(|| args[4..].join(" "));
    context
        .manager
        .record_external_balance(id, month, amount, source.as_deref())?;
    let outcome = match context.manager.reconcile_month(id, month, None) {
        Ok(outcome) => outcome,
        Err(ReconError::Core(CoreError::MonthNotFound(_))) => {
            output::info(format!(
                "{month} recorded; no statement balance to reconcile"
            ));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let code = statement_code(context, id)?;
    match outcome.status {
        ReconciliationStatus::Reconciled => output::success(format!("{month} reconciled")),
        ReconciliationStatus::Difference => output::warning(format!(
            "{month} differs by {}",
            money(context, outcome.delta, &code)
        )),
    }
    Ok(())
}

fn cmd_check(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id] = args else {
        return Err(usage("check <id>"));
    };
    let id = resolve_id(context, id)?;
    let rows = context.manager.reconcile_all(id)?;
    let code = statement_code(context, id)?;
    output::section("Reconciliation");
    if rows.is_empty() {
        output::info("No external balances recorded");
    }
    for row in &rows {
        output::line(render_reconciliation(context, row, &code));
    }
    let differences = rows
        .iter()
        .filter(|row| !row.outcome.is_reconciled())
        .count();
    let warnings = context.manager.warnings(id)?;
    for warning in &warnings {
        output::warning(warning);
    }
    if differences == 0 && warnings.is_empty() {
        output::success("No issues found");
    } else if differences > 0 {
        output::warning(format!(
            "{differences} month{} with differences",
            plural(differences)
        ));
    }
    Ok(())
}

fn cmd_finalize(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id] = args else {
        return Err(usage("finalize <id>"));
    };
    let id = resolve_id(context, id)?;
    let statement = context.manager.finalize(id)?;
    output::success(format!("Statement {} finalized", statement.id));
    Ok(())
}

fn cmd_list(context: &CliContext) -> Result<(), CliError> {
    let statements = context.manager.list()?;
    if statements.is_empty() {
        output::info("No statements stored");
        return Ok(());
    }
    for statement in statements {
        output::line(format!(
            "{}  {:<12} {:<16} {:<9} {:<10} {}",
            statement.id,
            statement.bank_id,
            statement.company_id,
            statement.statement_month.to_string(),
            statement.status.to_string(),
            statement.statement_period.as_deref().unwrap_or("-")
        ));
    }
    Ok(())
}

fn cmd_backup(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let Some((id, note)) = args.split_first() else {
        return Err(usage("backup <id> [note]"));
    };
    let id = resolve_id(context, id)?;
    let note = (!note.is_empty()).then(|| note.join(" "));
    let info = context.manager.backup(id, note.as_deref())?;
    output::success(format!("Backup created: {}", info.id));
    Ok(())
}

fn cmd_backups(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id] = args else {
        return Err(usage("backups <id>"));
    };
    let id = resolve_id(context, id)?;
    let backups = context.manager.list_backups(id)?;
    if backups.is_empty() {
        output::info("No backups");
    }
    for backup in backups {
        output::line(format!("{}  {}", backup.id, backup.created_at));
    }
    Ok(())
}

fn cmd_restore(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    let [id, backup] = args else {
        return Err(usage("restore <id> <backup>"));
    };
    let id = resolve_id(context, id)?;
    let statement = context.manager.restore_backup(id, backup)?;
    output::success(format!("Statement {} restored from {backup}", statement.id));
    Ok(())
}

fn cmd_config(context: &mut CliContext, args: &[&str]) -> Result<(), CliError> {
    const USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore <name>]";
    let Some((sub, rest)) = args.split_first() else {
        show_config(context);
        return Ok(());
    };
    match sub.to_ascii_lowercase().as_str() {
        "show" => show_config(context),
        "set" => {
            let Some((key, value)) = rest.split_first() else {
                return Err(usage("config set <key> <value>"));
            };
            let value = joined(value, "config set <key> <value>")?;
            let mut config = context.config.clone();
            set_config_value(&mut config, key, value.trim())?;
            context.replace_config(config)?;
            output::success(format!("{key} updated"));
        }
        "backup" => {
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            output::success(format!("Configuration backup created: {name}"));
        }
        "backups" => {
            let names = context.config_manager.list_backups()?;
            if names.is_empty() {
                output::info("No configuration backups");
            }
            for name in names {
                output::line(name);
            }
        }
        "restore" => {
            let [name] = rest else {
                return Err(usage("config restore <name>"));
            };
            let config = context.config_manager.restore(name)?;
            context.replace_config(config)?;
            output::success(format!("Configuration restored from {name}"));
        }
        _ => return Err(usage(USAGE)),
    }
    Ok(())
}

fn show_config(context: &CliContext) {
    let config = &context.config;
    output::section("Configuration");
    output::line(format!("locale:       {}", config.locale));
    output::line(format!("currency:     {}", config.currency));
    output::line(format!("reviewer:     {}", config.reviewer.as_deref().unwrap_or("-")));
    output::line(format!("color:        {}", on_off(config.ui_color_enabled)));
    output::line(format!("plain-output: {}", on_off(config.plain_output)));
    output::line(format!("retention:    {}", config.backup_retention));
    output::line(format!(
        "statements:   {}",
        config.resolve_statement_root().display()
    ));
    output::line(format!("backups:      {}", config.resolve_backup_root().display()));
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    match key.to_ascii_lowercase().as_str() {
        "locale" => config.locale = value.to_string(),
        "currency" => {
            let code = normalize_currency(value)
                .ok_or_else(|| invalid(value, "not a known currency"))?;
            config.currency = code.to_string();
        }
        "reviewer" => {
            config.reviewer = (!value.eq_ignore_ascii_case("none")).then(|| value.to_string())
        }
        "color" => config.ui_color_enabled = switch_arg(value)?,
        "plain-output" => config.plain_output = switch_arg(value)?,
        "retention" => {
            config.backup_retention = value
                .parse()
                .map_err(|_| invalid(value, "retention must be a whole number"))?
        }
        _ => {
            return Err(invalid(
                key,
                "keys are locale, currency, reviewer, color, plain-output, retention",
            ))
        }
    }
    Ok(())
}

fn switch_arg(value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(invalid(value, "expected on or off")),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn render_statement(context: &CliContext, statement: &BankStatement) {
    let code = statement_currency(context, statement);
    output::section(format!(
        "{} / {} / {}",
        statement.bank_id, statement.company_id, statement.statement_month
    ));
    output::line(format!("Id:       {}", statement.id));
    output::line(format!("Status:   {}", statement.status));
    output::line(format!("Currency: {code}"));
    output::line(format!(
        "Period:   {}",
        statement.statement_period.as_deref().unwrap_or("-")
    ));
    if statement.monthly_balances.is_empty() {
        output::info("No monthly balances");
        return;
    }
    output::line(format!(
        "{:<9} {:>18} {:>18} {:>5}  {}",
        "Month", "Opening", "Closing", "Page", "Verified"
    ));
    for balance in &statement.monthly_balances {
        let verified = match (&balance.verified_by, balance.is_verified) {
            (Some(by), true) => format!("yes ({by})"),
            (_, true) => "yes".to_string(),
            _ => "no".to_string(),
        };
        output::line(format!(
            "{:<9} {:>18} {:>18} {:>5}  {}",
            balance.key().to_string(),
            money(context, balance.opening_balance, &code),
            money(context, balance.closing_balance, &code),
            balance.statement_page,
            verified
        ));
    }
}

fn render_reconciliation(context: &CliContext, row: &MonthReconciliation, code: &CurrencyCode) -> String {
    format!(
        "{:<9} statement {:>16}  external {:>16}  {} ({})",
        row.month.to_string(),
        money(context, row.statement_balance, code),
        money(context, row.external_balance, code),
        row.outcome.status,
        money(context, row.outcome.delta, code)
    )
}

fn money(context: &CliContext, amount: Decimal, code: &CurrencyCode) -> String {
    let locale = LocaleConfig::for_tag(&context.config.locale);
    format_amount(amount, code, &locale, &FormatOptions::default())
}

fn default_code(context: &CliContext) -> CurrencyCode {
    normalize_currency(&context.config.currency).unwrap_or_default()
}

fn statement_currency(context: &CliContext, statement: &BankStatement) -> CurrencyCode {
    statement
        .currency
        .as_deref()
        .and_then(normalize_currency)
        .unwrap_or_else(|| default_code(context))
}

fn statement_code(context: &CliContext, id: Uuid) -> Result<CurrencyCode, CliError> {
    let statement = context.manager.load(id)?;
    Ok(statement_currency(context, &statement))
}

/// Accepts a full id, a unique id prefix or `last`.
fn resolve_id(context: &mut CliContext, raw: &str) -> Result<Uuid, CliError> {
    let id = if raw.eq_ignore_ascii_case("last") {
        context
            .last_statement
            .ok_or_else(|| invalid(raw, "no statement used yet in this session"))?
    } else if let Ok(id) = Uuid::from_str(raw) {
        id
    } else {
        let prefix = raw.to_ascii_lowercase();
        let matches: Vec<Uuid> = context
            .manager
            .list()?
            .into_iter()
            .map(|statement| statement.id)
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();
        match matches.as_slice() {
            [id] => *id,
            [] => return Err(invalid(raw, "no statement with this id")),
            _ => return Err(invalid(raw, "id prefix is ambiguous")),
        }
    };
    context.last_statement = Some(id);
    Ok(id)
}

fn month_arg(month: &str, year: &str) -> Result<MonthKey, CliError> {
    let month_number: u32 = month
        .parse()
        .map_err(|_| invalid(month, "month must be a number from 1 to 12"))?;
    let year_number: i32 = year.parse().map_err(|_| invalid(year, "year must be a number"))?;
    MonthKey::from_calendar(month_number, year_number)
        .ok_or_else(|| invalid(month, "month must be a number from 1 to 12"))
}

fn amount_arg(raw: &str) -> Result<Decimal, CliError> {
    parse_amount(raw).ok_or_else(|| invalid(raw, "not an amount"))
}

fn joined(args: &[&str], usage_text: &str) -> Result<String, CliError> {
    let text = args.join(" ");
    if text.trim().is_empty() {
        return Err(usage(usage_text));
    }
    Ok(text)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn usage(text: &str) -> CliError {
    CliError::Usage(format!("Usage: {text}"))
}

fn invalid(value: &str, reason: &str) -> CliError {
    CliError::InvalidArgument {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
