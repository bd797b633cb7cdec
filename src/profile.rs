//! Household profile: the JSON document the CLI reads its figures from.
//!
//! A profile is plain input. Loading it replays every entry through the
//! engines, so the same validation applies as for direct API calls.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::budget::Budget;
use crate::cashflow::{CashFlow, SourceKind};
use crate::debt::DebtBook;
use crate::emergency::EmergencyFund;
use crate::error::{FinanceError, ensure_non_negative};
use crate::forecast::{Forecaster, HistoricalPeriod};
use crate::frequency::Frequency;
use crate::health::HealthScorer;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub budget: BudgetSection,
    #[serde(default)]
    pub income: Vec<SourceSpec>,
    #[serde(default)]
    pub expenses: Vec<SourceSpec>,
    /// Monthly budget per expense source name.
    #[serde(default)]
    pub expense_budgets: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub savings_contribution: Decimal,
    #[serde(default)]
    pub history: Vec<HistoricalPeriod>,
    #[serde(default)]
    pub planned_expenses: Vec<Decimal>,
    #[serde(default)]
    pub debts: Vec<DebtSpec>,
    #[serde(default)]
    pub emergency_fund: EmergencySection,
    #[serde(default)]
    pub health: HealthSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetSection {
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub spends: Vec<SpendSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub allocated: Decimal,
    #[serde(default)]
    pub consumed: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendSpec {
    pub category: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub amount: Decimal,
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtSpec {
    pub name: String,
    pub balance: Decimal,
    pub interest_rate: Decimal,
    #[serde(default = "default_urgency")]
    pub urgency: u32,
    /// Payments replayed in order after the debt is added.
    #[serde(default)]
    pub payments: Vec<Decimal>,
}

fn default_urgency() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencySection {
    /// Falls back to the monthly expense total when absent.
    #[serde(default)]
    pub monthly_expenses: Option<Decimal>,
    #[serde(default = "default_emergency_months")]
    pub months: u32,
    #[serde(default)]
    pub saved: Decimal,
    #[serde(default)]
    pub monthly_contribution: Option<Decimal>,
}

fn default_emergency_months() -> u32 {
    6
}

impl Default for EmergencySection {
    fn default() -> Self {
        Self {
            monthly_expenses: None,
            months: default_emergency_months(),
            saved: Decimal::ZERO,
            monthly_contribution: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSection {
    #[serde(default)]
    pub savings: Decimal,
    #[serde(default)]
    pub liquid_assets: Decimal,
    /// Falls back to the sum of debt balances when absent.
    #[serde(default)]
    pub total_debts: Option<Decimal>,
    #[serde(default)]
    pub bank_accounts: BTreeMap<String, Decimal>,
}

/// Which part of the profile failed to load.
#[derive(Debug, Error)]
#[error("{section} entry '{entry}'")]
pub struct ProfileError {
    pub section: &'static str,
    pub entry: String,
    pub source: FinanceError,
}

trait InSection<T> {
    fn in_section(self, section: &'static str, entry: &str) -> Result<T, ProfileError>;
}

impl<T> InSection<T> for Result<T, FinanceError> {
    fn in_section(self, section: &'static str, entry: &str) -> Result<T, ProfileError> {
        self.map_err(|source| ProfileError {
            section,
            entry: entry.to_string(),
            source,
        })
    }
}

/// Every engine, populated from one profile.
#[derive(Debug, Clone)]
pub struct Household {
    pub budget: Budget,
    pub cashflow: CashFlow,
    pub debts: DebtBook,
    pub emergency_fund: EmergencyFund,
    pub forecaster: Forecaster,
    pub planned_expenses: Vec<Decimal>,
    pub emergency_contribution: Option<Decimal>,
    health: HealthSection,
}

impl Household {
    pub fn from_profile(profile: &Profile) -> Result<Self, ProfileError> {
        ensure_non_negative("income", profile.budget.income).in_section("budget", "income")?;
        let mut budget = Budget::new(profile.budget.income);
        for c in &profile.budget.categories {
            budget
                .add_category(&c.name, c.allocated, c.consumed)
                .in_section("budget category", &c.name)?;
        }
        for s in &profile.budget.spends {
            budget
                .record_spend(&s.category, s.amount)
                .in_section("budget spend", &s.category)?;
        }

        let mut cashflow = CashFlow::new();
        for (kind, specs) in [
            (SourceKind::Income, &profile.income),
            (SourceKind::Expense, &profile.expenses),
        ] {
            for s in specs {
                cashflow
                    .add_source(kind, &s.name, s.amount, s.frequency)
                    .in_section("cash-flow source", &s.name)?;
            }
        }
        for (name, amount) in &profile.expense_budgets {
            cashflow
                .set_expense_budget(name, *amount)
                .in_section("expense budget", name)?;
        }
        cashflow
            .set_savings_contribution(profile.savings_contribution)
            .in_section("savings contribution", "savings_contribution")?;

        let mut debts = DebtBook::new();
        for d in &profile.debts {
            debts
                .add_debt(&d.name, d.balance, d.interest_rate, d.urgency)
                .in_section("debt", &d.name)?;
            for payment in &d.payments {
                debts.pay(&d.name, *payment).in_section("debt payment", &d.name)?;
            }
        }

        let section = &profile.emergency_fund;
        let monthly_expenses = section
            .monthly_expenses
            .unwrap_or_else(|| cashflow.monthly_total(SourceKind::Expense));
        let mut emergency_fund = EmergencyFund::new();
        emergency_fund
            .set_goal(monthly_expenses, section.months)
            .in_section("emergency fund", "monthly_expenses")?;
        emergency_fund
            .set_progress(section.saved)
            .in_section("emergency fund", "saved")?;
        emergency_fund.recompute_remaining();

        let mut forecaster = Forecaster::new();
        for (i, period) in profile.history.iter().enumerate() {
            forecaster
                .add_period(period.income, period.expenses)
                .in_section("history", &format!("period {}", i + 1))?;
        }

        Ok(Self {
            budget,
            cashflow,
            debts,
            emergency_fund,
            forecaster,
            planned_expenses: profile.planned_expenses.clone(),
            emergency_contribution: section.monthly_contribution,
            health: profile.health.clone(),
        })
    }

    /// A scorer over this household's cash flow, seeded with the profile's
    /// savings, assets and debts.
    pub fn health_scorer(&self) -> Result<HealthScorer<'_>, ProfileError> {
        let mut scorer = HealthScorer::new(&self.cashflow);
        scorer
            .update_savings(self.health.savings)
            .in_section("health", "savings")?;
        scorer
            .update_liquid_assets(self.health.liquid_assets)
            .in_section("health", "liquid_assets")?;
        scorer
            .update_total_debts(
                self.health
                    .total_debts
                    .unwrap_or_else(|| self.debts.total_balance()),
            )
            .in_section("health", "total_debts")?;
        for (name, balance) in &self.health.bank_accounts {
            scorer
                .add_bank_account(name, *balance)
                .in_section("bank account", name)?;
        }
        Ok(scorer)
    }
}

impl Profile {
    /// Starter profile written by `finhealth init`.
    pub fn sample() -> Self {
        let source = |name: &str, amount, frequency| SourceSpec {
            name: name.to_string(),
            amount,
            frequency,
        };
        let category = |name: &str, allocated, consumed| CategorySpec {
            name: name.to_string(),
            allocated,
            consumed,
        };
        let debt = |name: &str, balance, interest_rate, urgency| DebtSpec {
            name: name.to_string(),
            balance,
            interest_rate,
            urgency,
            payments: Vec::new(),
        };

        Self {
            budget: BudgetSection {
                income: dec!(4200),
                categories: vec![
                    category("Rent", dec!(1500), dec!(1500)),
                    category("Groceries", dec!(500), dec!(320)),
                    category("Transportation", dec!(200), dec!(170)),
                    category("Entertainment", dec!(150), dec!(40)),
                ],
                spends: Vec::new(),
            },
            income: vec![
                source("Salary", dec!(3900), Frequency::Monthly),
                source("Freelance", dec!(75), Frequency::Weekly),
            ],
            expenses: vec![
                source("Rent", dec!(1500), Frequency::Monthly),
                source("Groceries", dec!(120), Frequency::Weekly),
                source("Utilities", dec!(180), Frequency::Monthly),
                source("Entertainment", dec!(150), Frequency::Monthly),
                source("Insurance", dec!(960), Frequency::Yearly),
            ],
            expense_budgets: BTreeMap::from([
                ("Entertainment".to_string(), dec!(160)),
                ("Utilities".to_string(), dec!(150)),
            ]),
            savings_contribution: dec!(20),
            history: vec![
                HistoricalPeriod {
                    income: dec!(4100),
                    expenses: dec!(3300),
                },
                HistoricalPeriod {
                    income: dec!(4200),
                    expenses: dec!(3450),
                },
                HistoricalPeriod {
                    income: dec!(4300),
                    expenses: dec!(3600),
                },
            ],
            planned_expenses: vec![
                Decimal::ZERO,
                dec!(250),
                Decimal::ZERO,
                dec!(1200),
                Decimal::ZERO,
                Decimal::ZERO,
            ],
            debts: vec![
                debt("Credit Card", dec!(3000), dec!(18.5), 2),
                debt("Car Loan", dec!(8000), dec!(4.5), 3),
                debt("Student Loan", dec!(12000), dec!(5.6), 1),
            ],
            emergency_fund: EmergencySection {
                monthly_expenses: None,
                months: 6,
                saved: dec!(4500),
                monthly_contribution: Some(dec!(400)),
            },
            health: HealthSection {
                savings: dec!(10000),
                liquid_assets: dec!(5000),
                total_debts: None,
                bank_accounts: BTreeMap::from([
                    ("Checking".to_string(), dec!(2400)),
                    ("Savings".to_string(), dec!(6100)),
                ]),
            },
        }
    }
}
