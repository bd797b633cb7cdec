//! Normalizes periodic amounts to a common daily cadence so that sources with
//! different frequencies can be summed and compared.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "D", alias = "d", alias = "daily")]
    Daily,
    #[serde(rename = "W", alias = "w", alias = "weekly")]
    Weekly,
    #[serde(rename = "M", alias = "m", alias = "monthly")]
    Monthly,
    #[serde(rename = "Y", alias = "y", alias = "yearly")]
    Yearly,
    #[serde(rename = "O", alias = "o", alias = "once")]
    OneTime,
}

impl Frequency {
    /// Parses the one-letter code (`D`, `W`, `M`, `Y`, `O`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "D" => Some(Self::Daily),
            "W" => Some(Self::Weekly),
            "M" => Some(Self::Monthly),
            "Y" => Some(Self::Yearly),
            "O" => Some(Self::OneTime),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::Yearly => "Y",
            Self::OneTime => "O",
        }
    }

    /// Days in one period. One-time amounts have no period.
    pub fn days(self) -> Option<Decimal> {
        match self {
            Self::Daily => Some(Decimal::ONE),
            Self::Weekly => Some(dec!(7)),
            Self::Monthly => Some(dec!(30)),
            Self::Yearly => Some(dec!(365)),
            Self::OneTime => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown frequency code '{s}' (use D, W, M, Y or O)"))
    }
}

/// Average daily contribution of `amount` paid at `frequency`.
///
/// One-time amounts contribute nothing to daily totals.
pub fn daily_equivalent(amount: Decimal, frequency: Frequency) -> Decimal {
    match frequency.days() {
        Some(days) => amount / days,
        None => Decimal::ZERO,
    }
}

/// Like [`daily_equivalent`] but for a raw code; unknown codes yield zero.
pub fn daily_equivalent_for_code(amount: Decimal, code: &str) -> Decimal {
    Frequency::from_code(code)
        .map(|f| daily_equivalent(amount, f))
        .unwrap_or(Decimal::ZERO)
}
