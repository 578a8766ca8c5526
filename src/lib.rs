#![doc(test(attr(deny(warnings))))]

//! Statement Recon resolves bank-statement periods into calendar months,
//! keeps one balance record per month and reconciles those balances against
//! bookkeeping figures.
//!
//! The building blocks live in the workspace crates re-exported below:
//! `recon_domain` holds the records, `recon_core` parses and reconciles,
//! `recon_config` keeps preferences and `recon_storage_json` persists.

pub mod cli;
pub mod currency;
pub mod errors;
pub mod manager;
pub mod utils;

pub use recon_config;
pub use recon_core;
pub use recon_domain;
pub use recon_storage_json;

pub use errors::{CliError, ReconError};
pub use manager::{DetectionReport, StatementManager};
pub use recon_core::{enumerate_months, parse_period, reconcile, synthesize_balances};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::debug!("statement_recon tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
