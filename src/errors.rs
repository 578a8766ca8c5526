use recon_config::ConfigError;
use recon_core::CoreError;
use thiserror::Error;

/// Error type surfaced by the statement reconciliation facade.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures reported to CLI users.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("Invalid argument `{value}`: {reason}")]
    InvalidArgument { value: String, reason: String },
    #[error("Unknown command `{0}`. Run `help` for the command list.")]
    UnknownCommand(String),
    #[error(transparent)]
    Recon(#[from] ReconError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Recon(ReconError::Core(err))
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Recon(ReconError::Config(err))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Recon(ReconError::Serde(err))
    }
}
