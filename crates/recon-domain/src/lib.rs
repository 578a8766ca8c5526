//! recon-domain
//!
//! Pure domain models for bank statement periods, monthly balances and
//! reconciliation outcomes. No I/O, no CLI, no storage.

pub mod balance;
pub mod month;
pub mod period;
pub mod reconciliation;
pub mod statement;

pub use balance::*;
pub use month::*;
pub use period::*;
pub use reconciliation::*;
pub use statement::*;
