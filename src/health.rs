//! Composite financial-health score built on top of the cash-flow tracker.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::cashflow::{CashFlow, SourceKind};
use crate::domain::{Name, Series};
use crate::error::{FinanceError, Result, ensure_within_limit};

const STRONG_ABOVE: Decimal = dec!(1.5);
const STABLE_FROM: Decimal = Decimal::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Strong,
    Stable,
    AtRisk,
}

impl HealthStatus {
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Strong => {
                "Recommendation: Keep up the good work! Consider diversifying your investments."
            }
            Self::Stable => {
                "Recommendation: Focus on increasing savings or paying down debt to improve your financial health."
            }
            Self::AtRisk => {
                "Recommendation: Consider reducing monthly expenses and increasing savings to get back on track."
            }
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strong => "Strong",
            Self::Stable => "Stable",
            Self::AtRisk => "At Risk",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeExpenseStatus {
    OnTrack,
    Caution,
    Overspending,
}

impl IncomeExpenseStatus {
    pub fn message(self) -> &'static str {
        match self {
            Self::OnTrack => "You're on track with a positive cash flow.",
            Self::Caution => "Your income matches your expenses, be mindful of unexpected expenses.",
            Self::Overspending => "You're overspending. Consider cutting back on expenses.",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::OnTrack => {
                "Recommendation: Great job! You might consider increasing your savings or investing surplus funds."
            }
            Self::Caution => {
                "Recommendation: Consider building a buffer in your savings for unplanned costs."
            }
            Self::Overspending => "Recommendation: Review your expenses and find areas to cut back.",
        }
    }
}

impl fmt::Display for IncomeExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OnTrack => "On Track",
            Self::Caution => "Caution",
            Self::Overspending => "Overspending",
        })
    }
}

/// Savings and debt histories, paired by update index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavingsDebtTrend {
    pub savings: Vec<Decimal>,
    pub debts: Vec<Decimal>,
}

/// Scores a household against its monthly expenses.
///
/// Reads income and expense totals from a borrowed [`CashFlow`]; savings,
/// assets and debts are supplied by the caller.
#[derive(Debug, Clone)]
pub struct HealthScorer<'a> {
    cashflow: &'a CashFlow,
    savings: Decimal,
    liquid_assets: Decimal,
    total_debts: Decimal,
    bank_accounts: BTreeMap<Name, Decimal>,
    scores: Vec<Decimal>,
    savings_history: Vec<Decimal>,
    debts_history: Vec<Decimal>,
}

impl<'a> HealthScorer<'a> {
    pub fn new(cashflow: &'a CashFlow) -> Self {
        Self {
            cashflow,
            savings: Decimal::ZERO,
            liquid_assets: Decimal::ZERO,
            total_debts: Decimal::ZERO,
            bank_accounts: BTreeMap::new(),
            scores: Vec::new(),
            savings_history: Vec::new(),
            debts_history: Vec::new(),
        }
    }

    // The setters bound every input so that `compute` cannot overflow.

    pub fn update_savings(&mut self, amount: Decimal) -> Result<()> {
        ensure_within_limit("savings", amount)?;
        self.savings = amount;
        self.savings_history.push(amount);
        Ok(())
    }

    pub fn update_liquid_assets(&mut self, amount: Decimal) -> Result<()> {
        ensure_within_limit("liquid assets", amount)?;
        self.liquid_assets = amount;
        Ok(())
    }

    pub fn update_total_debts(&mut self, amount: Decimal) -> Result<()> {
        ensure_within_limit("total debts", amount)?;
        self.total_debts = amount;
        self.debts_history.push(amount);
        Ok(())
    }

    pub fn savings(&self) -> Decimal {
        self.savings
    }

    pub fn liquid_assets(&self) -> Decimal {
        self.liquid_assets
    }

    pub fn total_debts(&self) -> Decimal {
        self.total_debts
    }

    pub fn monthly_income(&self) -> Decimal {
        self.cashflow.monthly_total(SourceKind::Income)
    }

    /// Never below 1, so it is always safe to divide by.
    pub fn monthly_expenses(&self) -> Decimal {
        self.cashflow
            .monthly_total(SourceKind::Expense)
            .max(Decimal::ONE)
    }

    /// `(savings + liquid assets - debts) / monthly expenses`, without
    /// recording anything.
    pub fn compute(&self) -> Decimal {
        (self.savings + self.liquid_assets - self.total_debts) / self.monthly_expenses()
    }

    pub fn record(&mut self, score: Decimal) {
        self.scores.push(score);
    }

    /// Computes the score, records it, and returns it rounded to two places.
    ///
    /// Every call is a history event: asking twice records twice.
    pub fn score(&mut self) -> Decimal {
        let score = self.compute();
        self.record(score);
        debug!(%score, recorded = self.scores.len(), "health score recorded");
        score.round_dp(2)
    }

    pub fn scores(&self) -> &[Decimal] {
        &self.scores
    }

    pub fn status(score: Decimal) -> HealthStatus {
        if score > STRONG_ABOVE {
            HealthStatus::Strong
        } else if score >= STABLE_FROM {
            HealthStatus::Stable
        } else {
            HealthStatus::AtRisk
        }
    }

    pub fn income_expense_status(&self) -> IncomeExpenseStatus {
        let income = self.monthly_income();
        let expenses = self.monthly_expenses();
        if income > expenses {
            IncomeExpenseStatus::OnTrack
        } else if income == expenses {
            IncomeExpenseStatus::Caution
        } else {
            IncomeExpenseStatus::Overspending
        }
    }

    /// Percent of monthly income left after expenses, floored at 0.
    pub fn savings_capacity(&self) -> Result<Decimal> {
        let income = self.monthly_income();
        if income.is_zero() {
            return Err(FinanceError::DivisionUndefined {
                what: "savings capacity with no income",
            });
        }
        let capacity = (income - self.monthly_expenses()) / income * Decimal::ONE_HUNDRED;
        Ok(capacity.max(Decimal::ZERO))
    }

    pub fn savings_recommendation(capacity: Decimal) -> &'static str {
        if capacity < dec!(10) {
            "Recommendation: Aim to increase your savings rate by reducing discretionary spending."
        } else if capacity < dec!(20) {
            "Recommendation: Consider reviewing your budget for more savings opportunities."
        } else {
            "Recommendation: You're doing well with saving. Consider exploring investment options for better growth."
        }
    }

    pub fn debt_vs_savings(&self) -> &'static str {
        let cushion = self.savings + self.liquid_assets;
        if self.total_debts > cushion {
            "Recommendation: Focus on reducing debts, especially high-interest ones."
        } else if self.total_debts == cushion {
            "Recommendation: Aim to increase your savings to ensure greater financial security."
        } else {
            "Recommendation: Great job maintaining a positive balance. Consider further investments or building an emergency fund."
        }
    }

    /// Adds or updates an account balance.
    pub fn add_bank_account(&mut self, name: &str, balance: Decimal) -> Result<()> {
        let name = Name::parse(name)?;
        ensure_within_limit("account balance", balance)?;
        debug!(account = %name, %balance, "bank account updated");
        self.bank_accounts.insert(name, balance);
        Ok(())
    }

    pub fn remove_bank_account(&mut self, name: &str) -> Result<Decimal> {
        self.bank_accounts
            .remove(name)
            .ok_or_else(|| FinanceError::not_found("bank account", name))
    }

    pub fn bank_accounts(&self) -> &BTreeMap<Name, Decimal> {
        &self.bank_accounts
    }

    pub fn total_liquid_assets(&self) -> Decimal {
        self.bank_accounts.values().copied().sum::<Decimal>() + self.liquid_assets
    }

    /// Account balances plus any other liquid assets as one extra slice.
    pub fn liquid_asset_series(&self) -> Series {
        let mut series: Series = self
            .bank_accounts
            .iter()
            .map(|(name, balance)| (name.to_string(), *balance))
            .collect();
        if self.liquid_assets > Decimal::ZERO {
            series.push("Other Liquid Assets", self.liquid_assets);
        }
        series
    }

    /// `None` until at least two scores are recorded.
    pub fn score_trend(&self) -> Option<Series> {
        if self.scores.len() < 2 {
            return None;
        }
        Some(
            self.scores
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("month {}", i + 1), *s))
                .collect(),
        )
    }

    /// `None` until both savings and debts have at least two updates.
    pub fn savings_debt_trend(&self) -> Option<SavingsDebtTrend> {
        if self.savings_history.len() < 2 || self.debts_history.len() < 2 {
            return None;
        }
        Some(SavingsDebtTrend {
            savings: self.savings_history.clone(),
            debts: self.debts_history.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::Frequency;

    fn cashflow(income: Decimal, expenses: Decimal) -> CashFlow {
        let mut cf = CashFlow::new();
        if !income.is_zero() {
            cf.add_source(SourceKind::Income, "Salary", income, Frequency::Monthly)
                .unwrap();
        }
        if !expenses.is_zero() {
            cf.add_source(SourceKind::Expense, "Living", expenses, Frequency::Monthly)
                .unwrap();
        }
        cf
    }

    fn scorer(cf: &CashFlow) -> HealthScorer<'_> {
        let mut h = HealthScorer::new(cf);
        h.update_savings(dec!(10000)).unwrap();
        h.update_liquid_assets(dec!(5000)).unwrap();
        h.update_total_debts(dec!(3000)).unwrap();
        h
    }

    #[test]
    fn score_matches_formula_and_is_strong() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let mut h = scorer(&cf);
        assert_eq!(h.monthly_expenses(), dec!(4500));
        let score = h.score();
        assert_eq!(score, dec!(2.67));
        assert_eq!(HealthScorer::status(score), HealthStatus::Strong);
    }

    #[test]
    fn scoring_twice_records_twice_with_same_value() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let mut h = scorer(&cf);
        let first = h.score();
        let second = h.score();
        assert_eq!(first, second);
        assert_eq!(h.scores().len(), 2);
        assert_eq!(h.scores()[0], h.scores()[1]);
    }

    #[test]
    fn compute_does_not_record() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let h = scorer(&cf);
        let _ = h.compute();
        assert!(h.scores().is_empty());
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(HealthScorer::status(dec!(1.51)), HealthStatus::Strong);
        assert_eq!(HealthScorer::status(dec!(1.5)), HealthStatus::Stable);
        assert_eq!(HealthScorer::status(dec!(1.0)), HealthStatus::Stable);
        assert_eq!(HealthScorer::status(dec!(0.99)), HealthStatus::AtRisk);
        assert_eq!(HealthScorer::status(dec!(-2)), HealthStatus::AtRisk);
    }

    #[test]
    fn no_expenses_divides_by_one() {
        let cf = CashFlow::new();
        let mut h = scorer(&cf);
        assert_eq!(h.monthly_expenses(), Decimal::ONE);
        assert_eq!(h.score(), dec!(12000));
    }

    #[test]
    fn savings_capacity_and_zero_income() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let h = scorer(&cf);
        assert_eq!(h.savings_capacity().unwrap(), dec!(25));

        let overspent = cashflow(dec!(3000), dec!(4500));
        assert_eq!(scorer(&overspent).savings_capacity().unwrap(), Decimal::ZERO);

        let none = cashflow(Decimal::ZERO, dec!(4500));
        assert!(matches!(
            scorer(&none).savings_capacity(),
            Err(FinanceError::DivisionUndefined { .. })
        ));
    }

    #[test]
    fn income_expense_status_tiers() {
        let cf = cashflow(dec!(6000), dec!(4500));
        assert_eq!(scorer(&cf).income_expense_status(), IncomeExpenseStatus::OnTrack);
        let cf = cashflow(dec!(4500), dec!(4500));
        assert_eq!(scorer(&cf).income_expense_status(), IncomeExpenseStatus::Caution);
        let cf = cashflow(dec!(3000), dec!(4500));
        assert_eq!(
            scorer(&cf).income_expense_status(),
            IncomeExpenseStatus::Overspending
        );
    }

    #[test]
    fn bank_accounts_feed_liquid_assets() {
        let cf = CashFlow::new();
        let mut h = scorer(&cf);
        h.add_bank_account("Checking", dec!(1200)).unwrap();
        h.add_bank_account("Savings", dec!(800)).unwrap();
        h.add_bank_account("Checking", dec!(1500)).unwrap();
        assert_eq!(h.total_liquid_assets(), dec!(7300));

        let series = h.liquid_asset_series();
        assert_eq!(series.labels, vec!["Checking", "Savings", "Other Liquid Assets"]);

        assert_eq!(h.remove_bank_account("Savings").unwrap(), dec!(800));
        assert!(matches!(
            h.remove_bank_account("Savings"),
            Err(FinanceError::NotFound { .. })
        ));
    }

    #[test]
    fn trends_need_two_points() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let mut h = scorer(&cf);
        h.score();
        assert!(h.score_trend().is_none());
        assert!(h.savings_debt_trend().is_none());

        h.update_savings(dec!(11000)).unwrap();
        h.update_total_debts(dec!(2500)).unwrap();
        h.score();
        assert_eq!(h.score_trend().unwrap().len(), 2);
        let trend = h.savings_debt_trend().unwrap();
        assert_eq!(trend.savings, vec![dec!(10000), dec!(11000)]);
        assert_eq!(trend.debts, vec![dec!(3000), dec!(2500)]);
    }

    #[test]
    fn debt_vs_savings_recommendations() {
        let cf = CashFlow::new();
        let mut h = scorer(&cf);
        assert!(h.debt_vs_savings().contains("Great job"));
        h.update_total_debts(dec!(15000)).unwrap();
        assert!(h.debt_vs_savings().contains("increase your savings"));
        h.update_total_debts(dec!(20000)).unwrap();
        assert!(h.debt_vs_savings().contains("Focus on reducing debts"));
    }

    #[test]
    fn oversized_figures_are_rejected_and_score_stays_defined() {
        let cf = cashflow(dec!(6000), dec!(4500));
        let mut h = scorer(&cf);
        assert!(matches!(
            h.update_total_debts(Decimal::MAX),
            Err(FinanceError::AmountTooLarge { field: "total debts", .. })
        ));
        assert!(h.update_savings(Decimal::MIN).is_err());
        assert!(h.add_bank_account("Vault", Decimal::MAX).is_err());
        assert_eq!(h.total_debts(), dec!(3000));
        assert_eq!(h.score(), dec!(2.67));
    }
}
