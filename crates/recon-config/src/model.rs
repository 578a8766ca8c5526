use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

/// Environment variable overriding the base directory for statements and backups.
pub const HOME_ENV: &str = "STATEMENT_RECON_HOME";

/// Stores reviewer preferences and storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    /// ISO code assumed for statements that do not name their currency.
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default)]
    pub plain_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for statement records. Defaults to `<base>/statements`.
    pub statement_root: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for statement backups. Defaults to `<statement root>/backups`.
    pub backup_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    /// Name recorded as verifier when a command does not supply one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-KE".into(),
            currency: "KES".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            plain_output: false,
            statement_root: None,
            backup_root: None,
            backup_retention: Self::default_backup_retention(),
            reviewer: None,
        }
    }
}

impl Config {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    /// Base directory holding config, statements and backups unless configured otherwise.
    ///
    /// `STATEMENT_RECON_HOME` wins over `~/Documents/Statements`.
    pub fn base_dir() -> PathBuf {
        if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Statements")
    }

    pub fn resolve_statement_root(&self) -> PathBuf {
        if let Some(path) = &self.statement_root {
            return path.clone();
        }
        Self::base_dir().join("statements")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.backup_root {
            return path.clone();
        }
        self.resolve_statement_root().join("backups")
    }

    pub fn reviewer_name(&self) -> Option<&str> {
        self.reviewer
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
