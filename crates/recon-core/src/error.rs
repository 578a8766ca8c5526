use recon_domain::MonthKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Statement not found: {0}")]
    StatementNotFound(String),
    #[error("No monthly balance recorded for {0}")]
    MonthNotFound(MonthKey),
    #[error("Monthly balance for {0} already exists")]
    DuplicateMonth(MonthKey),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
