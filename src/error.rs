use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

/// Largest amount (or rate) any engine accepts: one trillion.
///
/// Sums and products of accepted amounts stay far inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Longest projection, in months, that forecasts and trajectories build.
pub const MAX_HORIZON_MONTHS: usize = 1200;

/// Domain-level failures reported by the bookkeeping engines.
///
/// None of these are fatal: the caller decides whether to re-prompt or abort.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FinanceError {
    #[error(
        "Allocating {requested} to '{category}' exceeds income: only {available} left unallocated"
    )]
    OverAllocated {
        category: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("'{category}' already consumed {consumed}, more than its allocation of {allocated}")]
    OverConsumed {
        category: String,
        allocated: Decimal,
        consumed: Decimal,
    },

    #[error("No such {entity}: '{name}'")]
    NotFound { entity: &'static str, name: String },

    #[error(
        "Monthly payment of {payment} does not cover the {interest} of monthly interest on '{debt}'"
    )]
    InsufficientPayment {
        debt: String,
        payment: Decimal,
        interest: Decimal,
    },

    #[error("Expected {expected} planned values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{what} is undefined: division by zero")]
    DivisionUndefined { what: &'static str },

    #[error("No historical periods recorded; add at least one before forecasting")]
    NoHistory,

    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{field} of {value} is above the supported maximum of {max}")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },

    #[error("{what} does not fit in a decimal amount")]
    Overflow { what: &'static str },

    #[error("A horizon of {requested} months is longer than the supported {max}")]
    HorizonTooLong { requested: Decimal, max: usize },

    #[error("Invalid name: {0:?}")]
    InvalidName(String),
}

impl FinanceError {
    pub(crate) fn not_found(entity: &'static str, name: &str) -> Self {
        Self::NotFound {
            entity,
            name: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinanceError>;

/// Accepts `0 ..= MAX_AMOUNT`.
pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(FinanceError::NegativeAmount { field, value });
    }
    ensure_within_limit(field, value)
}

/// Accepts any sign, as long as the magnitude is at most `MAX_AMOUNT`.
pub(crate) fn ensure_within_limit(field: &'static str, value: Decimal) -> Result<()> {
    if value.abs() > MAX_AMOUNT {
        return Err(FinanceError::AmountTooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Checked sum, for totals built from values that were not range-checked.
pub(crate) fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or(FinanceError::Overflow { what })
}
