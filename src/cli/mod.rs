//! Command-line front end: one-shot commands from argv, or a script read from
//! stdin when `STATEMENT_RECON_CLI_SCRIPT` is set.

pub mod commands;
pub mod output;

use std::{
    env,
    io::{self, BufRead},
};

use recon_config::{Config, ConfigManager};
use shell_words::split;
use uuid::Uuid;

use crate::{errors::CliError, manager::StatementManager};

pub const SCRIPT_ENV: &str = "STATEMENT_RECON_CLI_SCRIPT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    OneShot,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// State shared by the commands of one CLI session.
pub struct CliContext {
    pub manager: StatementManager,
    pub config: Config,
    pub config_manager: ConfigManager,
    /// Statement touched most recently, addressable as `last`.
    pub last_statement: Option<Uuid>,
}

impl CliContext {
    pub fn new(config_manager: ConfigManager, config: Config) -> Result<Self, CliError> {
        apply_output_preferences(&config);
        let manager = StatementManager::from_config(&config)?;
        Ok(Self {
            manager,
            config,
            config_manager,
            last_statement: None,
        })
    }

    /// Swaps in `config`, persists it and rebuilds the manager from it.
    pub fn replace_config(&mut self, config: Config) -> Result<(), CliError> {
        self.config_manager.save(&config)?;
        apply_output_preferences(&config);
        self.manager = StatementManager::from_config(&config)?;
        self.config = config;
        Ok(())
    }

    /// Loads the config stored under the base directory.
    pub fn from_environment() -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(Config::base_dir())?;
        let config = config_manager.load()?;
        Self::new(config_manager, config)
    }
}

fn apply_output_preferences(config: &Config) {
    output::set_preferences(output::OutputPreferences {
        plain_output: config.plain_output,
        color_enabled: config.ui_color_enabled,
    });
}

pub fn run_cli() -> Result<(), CliError> {
    let mode = if env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::OneShot
    };
    let mut context = CliContext::from_environment()?;

    match mode {
        CliMode::OneShot => {
            let args: Vec<String> = env::args().skip(1).collect();
            if args.is_empty() {
                commands::print_help();
                return Err(CliError::Usage("missing command".into()));
            }
            commands::dispatch(&mut context, &args).map(|_| ())
        }
        CliMode::Script => run_script(&mut context),
    }
}

/// Runs one command per stdin line. Failures are reported and the script goes on.
fn run_script(context: &mut CliContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => output::error(err),
        }
    }
    Ok(())
}

fn handle_line(context: &mut CliContext, line: &str) -> Result<LoopControl, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LoopControl::Continue);
    }
    let tokens = match split(trimmed) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(format!("could not read `{trimmed}`: {err}"));
            return Ok(LoopControl::Continue);
        }
    };
    if tokens.is_empty() {
        return Ok(LoopControl::Continue);
    }
    commands::dispatch(context, &tokens)
}
