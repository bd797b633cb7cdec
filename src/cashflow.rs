//! Income and expense sources normalized to daily equivalents.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::domain::{Name, Series, percent_of};
use crate::error::{FinanceError, Result, ensure_non_negative};
use crate::frequency::{Frequency, daily_equivalent};

/// Days in the approximate month used to scale daily totals.
pub const DAYS_PER_MONTH: Decimal = dec!(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Income,
    Expense,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => f.write_str("income"),
            Self::Expense => f.write_str("expense"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub nominal_amount: Decimal,
    pub frequency: Frequency,
    pub daily_equivalent: Decimal,
}

/// What to do about the current balance of income and expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    ReduceCategory { name: Name, daily: Decimal },
    /// Deficit, but no expense source to point at.
    ReduceSpending,
    Surplus,
    Balanced,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReduceCategory { name, daily } => write!(
                f,
                "Suggestion: Consider reducing your spending in {name}, which accounts for ${:.2} daily.",
                daily.round_dp(2)
            ),
            Self::ReduceSpending => {
                f.write_str("Suggestion: Reduce spending or increase income to close the deficit.")
            }
            Self::Surplus => f.write_str("You have surplus funds. Consider investing or saving."),
            Self::Balanced => f.write_str(
                "Your income matches your expenses exactly. Consider reviewing your budget to see if you can save or invest some funds for future needs.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowStatus {
    Surplus(Decimal),
    BreakEven,
    Deficit(Decimal),
}

impl fmt::Display for CashFlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surplus(d) => write!(
                f,
                "Surplus: You have a positive cash flow of ${:.2} per day.",
                d.round_dp(2)
            ),
            Self::BreakEven => f.write_str("Break-even: Your income matches your expenses."),
            Self::Deficit(d) => write!(
                f,
                "Deficit: You are overspending by ${:.2} per day.",
                d.round_dp(2)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetUsage {
    pub name: Name,
    /// Utilization percent, capped at 100.
    pub utilized: Decimal,
    pub budget: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetAlert {
    Exceeded { name: Name, utilization: Decimal },
    Approaching { name: Name, utilization: Decimal },
}

impl fmt::Display for BudgetAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exceeded { name, utilization } => write!(
                f,
                "Exceeded budget for {name}! Spending is at {:.2}% of the budget.",
                utilization.round_dp(2)
            ),
            Self::Approaching { name, utilization } => write!(
                f,
                "Approaching budget limit for {name}. Spending is at {:.2}% of the budget.",
                utilization.round_dp(2)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposableSummary {
    pub disposable: Decimal,
    pub savings: Decimal,
    pub investable: Decimal,
}

impl DisposableSummary {
    pub fn suggestion(&self) -> String {
        if self.investable > Decimal::ZERO {
            format!(
                "Suggestion: You can consider investing ${:.2} into stocks, mutual funds, or other investments based on your financial goals.",
                self.investable.round_dp(2)
            )
        } else {
            "Suggestion: Focus on building more savings before considering investments."
                .to_string()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CashFlow {
    income: BTreeMap<Name, SourceEntry>,
    expenses: BTreeMap<Name, SourceEntry>,
    total_income: Decimal,
    total_expenses: Decimal,
    expense_budgets: BTreeMap<Name, Decimal>,
    savings_contribution: Decimal,
}

impl CashFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a source and adds its daily equivalent to the running total.
    ///
    /// Re-adding an existing name replaces the stored entry but still adds to
    /// the total, so the old contribution is counted twice.
    pub fn add_source(
        &mut self,
        kind: SourceKind,
        name: &str,
        amount: Decimal,
        frequency: Frequency,
    ) -> Result<()> {
        let name = Name::parse(name)?;
        ensure_non_negative("amount", amount)?;
        let daily = daily_equivalent(amount, frequency);
        let entry = SourceEntry {
            nominal_amount: amount,
            frequency,
            daily_equivalent: daily,
        };

        let (sources, total) = match kind {
            SourceKind::Income => (&mut self.income, &mut self.total_income),
            SourceKind::Expense => (&mut self.expenses, &mut self.total_expenses),
        };
        // The monthly total must stay representable too.
        let running = total
            .checked_add(daily)
            .filter(|t| t.checked_mul(DAYS_PER_MONTH).is_some())
            .ok_or(FinanceError::Overflow {
                what: "running daily total",
            })?;

        if frequency == Frequency::OneTime {
            debug!(%kind, source = %name, "one-time source adds nothing to daily totals");
        }
        if sources.insert(name.clone(), entry).is_some() {
            warn!(%kind, source = %name, "source re-added; running total now counts it twice");
        }
        *total = running;
        debug!(%kind, source = %name, %daily, %running, "source added");
        Ok(())
    }

    pub fn sources(&self, kind: SourceKind) -> &BTreeMap<Name, SourceEntry> {
        match kind {
            SourceKind::Income => &self.income,
            SourceKind::Expense => &self.expenses,
        }
    }

    /// Running daily-equivalent total.
    pub fn total(&self, kind: SourceKind) -> Decimal {
        match kind {
            SourceKind::Income => self.total_income,
            SourceKind::Expense => self.total_expenses,
        }
    }

    pub fn monthly_total(&self, kind: SourceKind) -> Decimal {
        self.total(kind) * DAYS_PER_MONTH
    }

    /// Each source's share of the running total, in percent. Empty when the
    /// total is zero; zero shares are left out.
    pub fn distribution(&self, kind: SourceKind) -> BTreeMap<Name, Decimal> {
        let total = self.total(kind);
        self.sources(kind)
            .iter()
            .filter_map(|(name, e)| {
                percent_of(e.daily_equivalent, total)
                    .filter(|pct| *pct > Decimal::ZERO)
                    .map(|pct| (name.clone(), pct))
            })
            .collect()
    }

    /// Expense with the largest daily equivalent; ties go to the first name.
    pub fn largest_expense(&self) -> Option<(&Name, &SourceEntry)> {
        self.expenses.iter().fold(None, |best, (name, e)| match best {
            Some((_, b)) if b.daily_equivalent >= e.daily_equivalent => best,
            _ => Some((name, e)),
        })
    }

    pub fn suggest_adjustment(&self, total_income: Decimal, total_expenses: Decimal) -> Adjustment {
        if total_expenses > total_income {
            match self.largest_expense() {
                Some((name, e)) => Adjustment::ReduceCategory {
                    name: name.clone(),
                    daily: e.daily_equivalent,
                },
                None => Adjustment::ReduceSpending,
            }
        } else if total_income > total_expenses {
            Adjustment::Surplus
        } else {
            Adjustment::Balanced
        }
    }

    /// Compares the entries' daily equivalents (not the running totals).
    pub fn cash_flow_status(&self) -> CashFlowStatus {
        let income: Decimal = self.income.values().map(|e| e.daily_equivalent).sum();
        let expenses: Decimal = self.expenses.values().map(|e| e.daily_equivalent).sum();
        if income > expenses {
            CashFlowStatus::Surplus(income - expenses)
        } else if income == expenses {
            CashFlowStatus::BreakEven
        } else {
            CashFlowStatus::Deficit(expenses - income)
        }
    }

    /// Sources ranked for the income-vs-expenses comparison: income largest
    /// first, expenses smallest first.
    pub fn ranked_sources(&self, kind: SourceKind) -> Series {
        let mut items: Vec<(&Name, Decimal)> = self
            .sources(kind)
            .iter()
            .map(|(n, e)| (n, e.daily_equivalent))
            .collect();
        match kind {
            SourceKind::Income => items.sort_by(|a, b| b.1.cmp(&a.1)),
            SourceKind::Expense => items.sort_by(|a, b| a.1.cmp(&b.1)),
        }
        items
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .collect()
    }

    pub fn set_expense_budget(&mut self, name: &str, amount: Decimal) -> Result<()> {
        let name = Name::parse(name)?;
        ensure_non_negative("budget", amount)?;
        self.expense_budgets.insert(name, amount);
        Ok(())
    }

    pub fn expense_budgets(&self) -> &BTreeMap<Name, Decimal> {
        &self.expense_budgets
    }

    fn budgeted_expenses(&self) -> impl Iterator<Item = (&Name, Decimal, Decimal)> {
        self.expenses.iter().filter_map(|(name, e)| {
            let budget = *self.expense_budgets.get(name)?;
            match percent_of(e.nominal_amount, budget) {
                Some(pct) => Some((name, pct, budget)),
                None => {
                    warn!(expense = %name, "zero budget; utilization undefined, skipped");
                    None
                }
            }
        })
    }

    /// Utilization of each budgeted expense, capped at 100 %.
    pub fn budget_utilization(&self) -> Vec<BudgetUsage> {
        self.budgeted_expenses()
            .map(|(name, pct, budget)| BudgetUsage {
                name: name.clone(),
                utilized: pct.min(Decimal::ONE_HUNDRED),
                budget,
            })
            .collect()
    }

    /// Expenses over their budget, or at/over `threshold_percent` of it.
    pub fn budget_alerts(&self, threshold_percent: Decimal) -> Vec<BudgetAlert> {
        self.budgeted_expenses()
            .filter_map(|(name, pct, _)| {
                if pct > Decimal::ONE_HUNDRED {
                    Some(BudgetAlert::Exceeded {
                        name: name.clone(),
                        utilization: pct,
                    })
                } else if pct >= threshold_percent {
                    Some(BudgetAlert::Approaching {
                        name: name.clone(),
                        utilization: pct,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn set_savings_contribution(&mut self, amount: Decimal) -> Result<()> {
        ensure_non_negative("savings contribution", amount)?;
        self.savings_contribution = amount;
        Ok(())
    }

    pub fn savings_contribution(&self) -> Decimal {
        self.savings_contribution
    }

    /// Daily income left after the essential expense categories, floored at 0.
    pub fn disposable_income(&self, essentials: &[String]) -> Decimal {
        let essential: Decimal = self
            .expenses
            .iter()
            .filter(|(name, _)| essentials.iter().any(|e| e == name.as_str()))
            .map(|(_, e)| e.daily_equivalent)
            .sum();
        let income: Decimal = self.income.values().map(|e| e.daily_equivalent).sum();
        (income - essential).max(Decimal::ZERO)
    }

    pub fn money_left_to_invest(&self, disposable: Decimal) -> Decimal {
        let savings = self.savings_contribution.min(disposable);
        (disposable - savings).max(Decimal::ZERO)
    }

    pub fn disposable_summary(&self, essentials: &[String]) -> DisposableSummary {
        let disposable = self.disposable_income(essentials);
        DisposableSummary {
            disposable,
            savings: self.savings_contribution.min(disposable),
            investable: self.money_left_to_invest(disposable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MAX_AMOUNT;

    fn essentials() -> Vec<String> {
        ["Rent", "Utilities", "Debt Payments", "Groceries", "Transportation"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample() -> CashFlow {
        let mut cf = CashFlow::new();
        cf.add_source(SourceKind::Income, "Salary", dec!(3000), Frequency::Monthly).unwrap();
        cf.add_source(SourceKind::Income, "Side", dec!(70), Frequency::Weekly).unwrap();
        cf.add_source(SourceKind::Expense, "Rent", dec!(1500), Frequency::Monthly).unwrap();
        cf.add_source(SourceKind::Expense, "Food", dec!(20), Frequency::Daily).unwrap();
        cf
    }

    #[test]
    fn totals_accumulate_daily_equivalents() {
        let cf = sample();
        assert_eq!(cf.total(SourceKind::Income), dec!(110));
        assert_eq!(cf.total(SourceKind::Expense), dec!(70));
        assert_eq!(cf.monthly_total(SourceKind::Expense), dec!(2100));
    }

    #[test]
    fn re_adding_a_source_double_counts() {
        let mut cf = sample();
        cf.add_source(SourceKind::Income, "Salary", dec!(3000), Frequency::Monthly).unwrap();
        assert_eq!(cf.sources(SourceKind::Income).len(), 2);
        assert_eq!(cf.total(SourceKind::Income), dec!(210));
    }

    #[test]
    fn one_time_sources_do_not_move_totals() {
        let mut cf = sample();
        cf.add_source(SourceKind::Income, "Bonus", dec!(5000), Frequency::OneTime).unwrap();
        assert_eq!(cf.total(SourceKind::Income), dec!(110));
        assert!(!cf.distribution(SourceKind::Income).contains_key("Bonus"));
    }

    #[test]
    fn distribution_is_share_of_total() {
        let cf = sample();
        let dist = cf.distribution(SourceKind::Expense);
        assert_eq!(dist["Rent"].round_dp(2), dec!(71.43));
        assert_eq!(dist["Food"].round_dp(2), dec!(28.57));
    }

    #[test]
    fn distribution_of_empty_kind_is_empty() {
        assert!(CashFlow::new().distribution(SourceKind::Income).is_empty());
    }

    #[test]
    fn largest_expense_by_daily_amount() {
        let cf = sample();
        let (name, entry) = cf.largest_expense().unwrap();
        assert_eq!(name.as_str(), "Rent");
        assert_eq!(entry.daily_equivalent, dec!(50));
        assert!(CashFlow::new().largest_expense().is_none());
    }

    #[test]
    fn adjustment_branches() {
        let cf = sample();
        let deficit = cf.suggest_adjustment(dec!(10), dec!(70));
        assert_eq!(
            deficit,
            Adjustment::ReduceCategory {
                name: Name::parse("Rent").unwrap(),
                daily: dec!(50)
            }
        );
        assert!(deficit.to_string().contains("Rent, which accounts for $50.00 daily"));
        assert_eq!(cf.suggest_adjustment(dec!(110), dec!(70)), Adjustment::Surplus);
        assert_eq!(cf.suggest_adjustment(dec!(70), dec!(70)), Adjustment::Balanced);
        assert_eq!(
            CashFlow::new().suggest_adjustment(Decimal::ZERO, dec!(1)),
            Adjustment::ReduceSpending
        );
    }

    #[test]
    fn cash_flow_status_reports_daily_gap() {
        assert_eq!(sample().cash_flow_status(), CashFlowStatus::Surplus(dec!(40)));
        assert_eq!(CashFlow::new().cash_flow_status(), CashFlowStatus::BreakEven);
    }

    #[test]
    fn ranked_sources_orders_for_comparison() {
        let cf = sample();
        assert_eq!(cf.ranked_sources(SourceKind::Income).labels, vec!["Salary", "Side"]);
        assert_eq!(cf.ranked_sources(SourceKind::Expense).labels, vec!["Food", "Rent"]);
    }

    #[test]
    fn budget_alerts_and_capped_utilization() {
        let mut cf = sample();
        cf.set_expense_budget("Rent", dec!(1400)).unwrap();
        cf.set_expense_budget("Food", dec!(25)).unwrap();
        cf.set_expense_budget("Travel", dec!(100)).unwrap();

        let usage = cf.budget_utilization();
        assert_eq!(usage.len(), 2);
        let rent = usage.iter().find(|u| u.name.as_str() == "Rent").unwrap();
        assert_eq!(rent.utilized, dec!(100));

        let alerts = cf.budget_alerts(dec!(80));
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().any(|a| matches!(a, BudgetAlert::Exceeded { name, .. } if name.as_str() == "Rent")));
        assert!(alerts.iter().any(|a| matches!(a, BudgetAlert::Approaching { utilization, .. } if *utilization == dec!(80))));
    }

    #[test]
    fn zero_budget_is_skipped() {
        let mut cf = sample();
        cf.set_expense_budget("Food", Decimal::ZERO).unwrap();
        assert!(cf.budget_utilization().is_empty());
        assert!(cf.budget_alerts(dec!(80)).is_empty());
    }

    #[test]
    fn disposable_income_subtracts_only_essentials() {
        let mut cf = sample();
        assert_eq!(cf.disposable_income(&essentials()), dec!(60));

        cf.set_savings_contribution(dec!(25)).unwrap();
        let summary = cf.disposable_summary(&essentials());
        assert_eq!(summary.savings, dec!(25));
        assert_eq!(summary.investable, dec!(35));
        assert!(summary.suggestion().contains("$35.00"));
    }

    #[test]
    fn disposable_income_floors_at_zero_and_savings_are_capped() {
        let mut cf = CashFlow::new();
        cf.add_source(SourceKind::Income, "Salary", dec!(300), Frequency::Monthly).unwrap();
        cf.add_source(SourceKind::Expense, "Rent", dec!(900), Frequency::Monthly).unwrap();
        cf.set_savings_contribution(dec!(50)).unwrap();
        let summary = cf.disposable_summary(&essentials());
        assert_eq!(summary.disposable, Decimal::ZERO);
        assert_eq!(summary.savings, Decimal::ZERO);
        assert_eq!(summary.investable, Decimal::ZERO);
        assert!(summary.suggestion().contains("Focus on building more savings"));
    }

    #[test]
    fn reported_amounts_round_to_the_cent() {
        let mut cf = CashFlow::new();
        cf.add_source(SourceKind::Expense, "Rent", dec!(1000), Frequency::Weekly).unwrap();
        let advice = cf.suggest_adjustment(Decimal::ZERO, cf.total(SourceKind::Expense));
        assert_eq!(
            advice.to_string(),
            "Suggestion: Consider reducing your spending in Rent, which accounts for $142.86 daily."
        );
        assert_eq!(
            cf.cash_flow_status().to_string(),
            "Deficit: You are overspending by $142.86 per day."
        );
    }

    #[test]
    fn oversized_source_is_rejected_without_touching_totals() {
        let mut cf = sample();
        assert!(matches!(
            cf.add_source(SourceKind::Expense, "Big", Decimal::MAX, Frequency::Daily),
            Err(FinanceError::AmountTooLarge { field: "amount", .. })
        ));
        assert!(cf.sources(SourceKind::Expense).get("Big").is_none());
        assert_eq!(cf.monthly_total(SourceKind::Expense), dec!(2100));

        cf.add_source(SourceKind::Expense, "Mansion", MAX_AMOUNT, Frequency::Daily)
            .unwrap();
        assert_eq!(
            cf.monthly_total(SourceKind::Expense),
            (MAX_AMOUNT + dec!(70)) * DAYS_PER_MONTH
        );
    }
}
