//! Personal-finance bookkeeping engines: category budgets, income and expense
//! tracking, debts, an emergency fund, a composite health score and an
//! average-based forecast.
//!
//! Everything lives in memory and is owned by the engine that created it.
//! Amounts are [`rust_decimal::Decimal`]; charts are left to the caller, which
//! receives plain labeled [`domain::Series`].

pub mod budget;
pub mod cashflow;
pub mod debt;
pub mod domain;
pub mod emergency;
pub mod error;
pub mod forecast;
pub mod frequency;
pub mod health;
pub mod profile;

pub use error::FinanceError;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_directive`.
pub fn init_tracing(default_directive: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
