use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Series, percent_of};
use crate::error::{FinanceError, MAX_HORIZON_MONTHS, Result, ensure_non_negative};

/// Emergency-fund goal and savings toward it.
///
/// `remaining` is a snapshot: it only moves when [`EmergencyFund::recompute_remaining`]
/// is called, not when the goal or progress change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFund {
    goal: Decimal,
    progress: Decimal,
    remaining: Decimal,
}

impl EmergencyFund {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goal(&self) -> Decimal {
        self.goal
    }

    pub fn progress(&self) -> Decimal {
        self.progress
    }

    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    pub fn set_goal(&mut self, monthly_expenses: Decimal, months: u32) -> Result<()> {
        ensure_non_negative("monthly expenses", monthly_expenses)?;
        self.goal = monthly_expenses * Decimal::from(months);
        debug!(goal = %self.goal, months, "emergency fund goal set");
        Ok(())
    }

    pub fn set_progress(&mut self, amount: Decimal) -> Result<()> {
        ensure_non_negative("saved amount", amount)?;
        self.progress = amount;
        Ok(())
    }

    pub fn recompute_remaining(&mut self) -> Decimal {
        self.remaining = self.goal - self.progress;
        self.remaining
    }

    /// Months of `monthly_contribution` needed to cover `remaining`, to one
    /// decimal place.
    pub fn months_to_goal(&self, monthly_contribution: Decimal) -> Result<Decimal> {
        if monthly_contribution.is_zero() {
            return Err(FinanceError::DivisionUndefined {
                what: "time to goal with no monthly contribution",
            });
        }
        let months = self
            .remaining
            .checked_div(monthly_contribution)
            .ok_or(FinanceError::Overflow {
                what: "time to goal",
            })?;
        Ok(months.round_dp(1))
    }

    pub fn progress_percent(&self) -> Result<Decimal> {
        percent_of(self.progress, self.goal)
            .map(|pct| pct.round_dp(1))
            .ok_or(FinanceError::DivisionUndefined {
                what: "progress toward a zero goal",
            })
    }

    /// Cumulative savings at `rate` per month, from month 0 until the goal is
    /// within reach. Horizons beyond `MAX_HORIZON_MONTHS` are refused.
    pub fn savings_trajectory(&self, rate: Decimal) -> Result<Series> {
        if rate <= Decimal::ZERO {
            return Err(FinanceError::DivisionUndefined {
                what: "savings trajectory without a positive contribution",
            });
        }
        let horizon = self
            .goal
            .checked_div(rate)
            .ok_or(FinanceError::Overflow {
                what: "savings trajectory",
            })?
            .floor();
        let last = horizon
            .to_usize()
            .filter(|months| *months <= MAX_HORIZON_MONTHS)
            .ok_or(FinanceError::HorizonTooLong {
                requested: horizon,
                max: MAX_HORIZON_MONTHS,
            })?;
        Ok((0..=last)
            .map(|month| {
                let month = Decimal::from(month);
                (format!("month {month}"), rate * month)
            })
            .collect())
    }
}
