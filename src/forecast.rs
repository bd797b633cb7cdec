//! Average-based projection of future income and expenses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{FinanceError, MAX_HORIZON_MONTHS, Result, checked_sum, ensure_non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPeriod {
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub income: Vec<Decimal>,
    pub expenses: Vec<Decimal>,
}

impl Projection {
    pub fn disposable(&self) -> Vec<Decimal> {
        self.income
            .iter()
            .zip(&self.expenses)
            .map(|(i, e)| i - e)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedProjection {
    pub disposable_income: Vec<Decimal>,
    pub adjusted_expenses: Vec<Decimal>,
}

/// A projected month that ends below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeficitAlert {
    /// 1-based month number.
    pub month: usize,
    pub deficit: Decimal,
}

impl fmt::Display for DeficitAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alert: You are projected to face a deficit of ${:.2} in month {}. Consider adjusting your spending or increasing income.",
            self.deficit.round_dp(2),
            self.month
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    history: Vec<HistoricalPeriod>,
}

impl Forecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_period(&mut self, income: Decimal, expenses: Decimal) -> Result<()> {
        ensure_non_negative("historical income", income)?;
        ensure_non_negative("historical expenses", expenses)?;
        self.history.push(HistoricalPeriod { income, expenses });
        Ok(())
    }

    pub fn history(&self) -> &[HistoricalPeriod] {
        &self.history
    }

    fn averages(&self) -> Result<(Decimal, Decimal)> {
        if self.history.is_empty() {
            return Err(FinanceError::NoHistory);
        }
        let n = Decimal::from(self.history.len());
        let income = checked_sum(self.history.iter().map(|p| p.income), "historical income")?;
        let expenses = checked_sum(self.history.iter().map(|p| p.expenses), "historical expenses")?;
        Ok((income / n, expenses / n))
    }

    /// Repeats the historical averages for `months` months.
    pub fn forecast(&self, months: usize) -> Result<Projection> {
        if months > MAX_HORIZON_MONTHS {
            return Err(FinanceError::HorizonTooLong {
                requested: Decimal::from(months),
                max: MAX_HORIZON_MONTHS,
            });
        }
        let (income, expenses) = self.averages()?;
        debug!(%income, %expenses, months, "forecast from averages");
        Ok(Projection {
            income: vec![income; months],
            expenses: vec![expenses; months],
        })
    }

    pub fn forecast_disposable(&self, months: usize) -> Result<Vec<Decimal>> {
        Ok(self.forecast(months)?.disposable())
    }

    /// Layers one planned expense per month on top of the projection.
    pub fn forecast_with_planned(
        &self,
        months: usize,
        planned: &[Decimal],
    ) -> Result<PlannedProjection> {
        if planned.len() != months {
            return Err(FinanceError::LengthMismatch {
                expected: months,
                actual: planned.len(),
            });
        }
        let projection = self.forecast(months)?;
        let overflow = || FinanceError::Overflow {
            what: "planned expenses",
        };
        let adjusted_expenses: Vec<Decimal> = projection
            .expenses
            .iter()
            .zip(planned)
            .map(|(projected, extra)| projected.checked_add(*extra).ok_or_else(overflow))
            .collect::<Result<_>>()?;
        let disposable_income = projection
            .income
            .iter()
            .zip(&adjusted_expenses)
            .map(|(income, expense)| income.checked_sub(*expense).ok_or_else(overflow))
            .collect::<Result<_>>()?;
        Ok(PlannedProjection {
            disposable_income,
            adjusted_expenses,
        })
    }

    pub fn deficit_alerts(&self, months: usize, planned: &[Decimal]) -> Result<Vec<DeficitAlert>> {
        let projection = self.forecast_with_planned(months, planned)?;
        Ok(projection
            .disposable_income
            .iter()
            .enumerate()
            .filter(|(_, d)| **d < Decimal::ZERO)
            .map(|(i, d)| DeficitAlert {
                month: i + 1,
                deficit: -*d,
            })
            .collect())
    }
}
