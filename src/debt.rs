//! Debts with interest, payment history and payoff estimates.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{Name, Series};
use crate::error::{FinanceError, Result, ensure_non_negative, ensure_within_limit};

/// Percent-per-year to fraction-per-month divisor (100 * 12).
const ANNUAL_PERCENT_TO_MONTHLY: Decimal = dec!(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtEntry {
    pub balance: Decimal,
    /// Annual rate in percent, e.g. `18.5`.
    pub interest_rate: Decimal,
    pub urgency: u32,
}

impl DebtEntry {
    pub fn monthly_rate(&self) -> Decimal {
        self.interest_rate / ANNUAL_PERCENT_TO_MONTHLY
    }

    /// Interest accrued on the current balance in one month.
    pub fn monthly_interest(&self) -> Decimal {
        self.balance * self.interest_rate / ANNUAL_PERCENT_TO_MONTHLY
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraPaymentSuggestion {
    pub name: Name,
    pub extra: Decimal,
    pub interest_saved: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedPayoff {
    pub increase_percent: Decimal,
    pub payment: Decimal,
    pub months: Result<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct DebtBook {
    debts: BTreeMap<Name, DebtEntry>,
    history: BTreeMap<Name, Vec<Decimal>>,
}

impl DebtBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a debt; its history restarts at `balance`.
    pub fn add_debt(
        &mut self,
        name: &str,
        balance: Decimal,
        interest_rate: Decimal,
        urgency: u32,
    ) -> Result<()> {
        let name = Name::parse(name)?;
        ensure_non_negative("balance", balance)?;
        ensure_non_negative("interest rate", interest_rate)?;

        debug!(debt = %name, %balance, %interest_rate, urgency, "debt added");
        self.history.insert(name.clone(), vec![balance]);
        self.debts.insert(
            name,
            DebtEntry {
                balance,
                interest_rate,
                urgency,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DebtEntry> {
        self.debts.get(name)
    }

    pub fn debts(&self) -> &BTreeMap<Name, DebtEntry> {
        &self.debts
    }

    pub fn total_balance(&self) -> Decimal {
        self.debts.values().map(|d| d.balance).sum()
    }

    pub fn history(&self, name: &str) -> Option<&[Decimal]> {
        self.history.get(name).map(Vec::as_slice)
    }

    /// Highest interest first, then smallest balance, then most urgent.
    pub fn prioritize(&self) -> Vec<(&Name, &DebtEntry)> {
        let mut ordered: Vec<_> = self.debts.iter().collect();
        ordered.sort_by(|(_, a), (_, b)| {
            b.interest_rate
                .cmp(&a.interest_rate)
                .then(a.balance.cmp(&b.balance))
                .then(b.urgency.cmp(&a.urgency))
        });
        ordered
    }

    /// Pays down a debt; the balance never goes below zero.
    pub fn pay(&mut self, name: &str, amount: Decimal) -> Result<()> {
        ensure_non_negative("payment", amount)?;
        let Some(debt) = self.debts.get_mut(name) else {
            return Err(FinanceError::not_found("debt", name));
        };
        debt.balance = (debt.balance - amount).max(Decimal::ZERO);
        if let Some(history) = self.history.get_mut(name) {
            history.push(debt.balance);
        }
        debug!(debt = name, %amount, balance = %debt.balance, "payment recorded");
        Ok(())
    }

    /// Months of equal payments needed to clear the debt under monthly
    /// compounding.
    pub fn payoff_months(&self, name: &str, monthly_payment: Decimal) -> Result<u32> {
        let debt = self
            .debts
            .get(name)
            .ok_or_else(|| FinanceError::not_found("debt", name))?;
        payoff_months(name, debt, monthly_payment)
    }

    /// Payoff time when the payment is raised by each of `increases` percent.
    pub fn adjusted_payoffs(
        &self,
        name: &str,
        monthly_payment: Decimal,
        increases: &[Decimal],
    ) -> Result<Vec<AdjustedPayoff>> {
        let debt = self
            .debts
            .get(name)
            .ok_or_else(|| FinanceError::not_found("debt", name))?;
        ensure_within_limit("monthly payment", monthly_payment)?;
        for pct in increases {
            ensure_within_limit("payment increase", *pct)?;
        }
        Ok(increases
            .iter()
            .map(|pct| {
                let payment = monthly_payment * (Decimal::ONE + *pct / Decimal::ONE_HUNDRED);
                AdjustedPayoff {
                    increase_percent: *pct,
                    payment,
                    months: payoff_months(name, debt, payment),
                }
            })
            .collect())
    }

    /// Puts `fraction` of disposable income toward each outstanding debt,
    /// highest rate first, and estimates the interest it saves this month.
    pub fn suggest_extra_payment(
        &self,
        disposable_income: Decimal,
        fraction: Decimal,
    ) -> Result<Vec<ExtraPaymentSuggestion>> {
        ensure_within_limit("disposable income", disposable_income)?;
        ensure_within_limit("extra payment fraction", fraction)?;
        let extra = disposable_income * fraction;
        let mut ordered: Vec<_> = self.debts.iter().collect();
        ordered.sort_by(|(_, a), (_, b)| b.interest_rate.cmp(&a.interest_rate));
        Ok(ordered
            .into_iter()
            .filter(|(_, d)| d.balance > Decimal::ZERO)
            .map(|(name, d)| ExtraPaymentSuggestion {
                name: name.clone(),
                extra,
                interest_saved: extra * d.monthly_rate(),
            })
            .collect())
    }

    /// Balance histories, padded with `None` to the longest one.
    pub fn progress_table(&self) -> Vec<(&Name, Vec<Option<Decimal>>)> {
        let longest = self.history.values().map(Vec::len).max().unwrap_or(0);
        self.history
            .iter()
            .map(|(name, h)| {
                let mut row: Vec<Option<Decimal>> = h.iter().copied().map(Some).collect();
                row.resize(longest, None);
                (name, row)
            })
            .collect()
    }

    pub fn balance_series(&self) -> Series {
        self.prioritize()
            .into_iter()
            .map(|(name, d)| (name.to_string(), d.balance))
            .collect()
    }
}

fn payoff_months(name: &str, debt: &DebtEntry, payment: Decimal) -> Result<u32> {
    if debt.balance <= Decimal::ZERO {
        return Ok(0);
    }

    ensure_within_limit("monthly payment", payment)?;
    let interest = debt.monthly_interest();
    if payment <= interest || payment <= Decimal::ZERO {
        return Err(FinanceError::InsufficientPayment {
            debt: name.to_string(),
            payment,
            interest,
        });
    }

    let rate = debt.monthly_rate();
    let months = if rate.is_zero() {
        debt.balance / payment
    } else {
        let numerator = (payment / (payment - interest)).checked_ln();
        let denominator = (Decimal::ONE + rate).checked_ln();
        match (numerator, denominator) {
            (Some(n), Some(d)) if !d.is_zero() => n / d,
            _ => {
                return Err(FinanceError::DivisionUndefined {
                    what: "payoff time",
                });
            }
        }
    };

    months
        .ceil()
        .to_u32()
        .ok_or(FinanceError::DivisionUndefined {
            what: "payoff time",
        })
}
