//! recon-core
//!
//! Statement period resolution, balance synthesis and reconciliation.
//! Depends on recon-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod balance_service;
pub mod error;
pub mod month_range;
pub mod period_parser;
pub mod reconciliation;
pub mod statement_service;
pub mod statement_text;
pub mod storage;

pub use balance_service::*;
pub use error::CoreError;
pub use month_range::*;
pub use period_parser::*;
pub use reconciliation::*;
pub use statement_service::*;
pub use statement_text::*;
