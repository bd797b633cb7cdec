use clap::{Args, Parser, Subcommand, ValueEnum};
use finhealth::cashflow::SourceKind;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "finhealth")]
#[command(about = "Budget, cash-flow, debt and financial-health checks", long_about = None)]
pub struct Cli {
    /// Override finhealth home directory (config/data subdirs will be created inside it).
    #[arg(long, env = "FINHEALTH_HOME")]
    pub home: Option<PathBuf>,

    /// Household profile to read (JSON). Defaults to the config's profile_path,
    /// then `<data dir>/profile.json`.
    #[arg(long, short = 'p', env = "FINHEALTH_PROFILE")]
    pub profile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a sample household profile to start from.
    Init(InitArgs),
    Config(ConfigArgs),

    Budget(BudgetArgs),
    Cashflow(CashflowArgs),
    Debt(DebtArgs),
    Emergency(EmergencyArgs),
    Health(HealthArgs),

    /// Project income and expenses from historical averages.
    Forecast(ForecastArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing profile.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    Show,
    Path,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum BudgetCmd {
    /// Allocated vs consumed per category, with totals and income share.
    Report {
        /// Only these categories (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long)]
        no_total: bool,
    },
    /// Categories at or above the utilization threshold.
    Alerts {
        #[arg(long)]
        threshold: Option<Decimal>,
    },
    /// Chart data: allocation (or consumption) per category.
    Chart {
        #[arg(long)]
        consumed: bool,
    },
}

#[derive(Debug, Args)]
pub struct BudgetArgs {
    #[command(subcommand)]
    pub cmd: BudgetCmd,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Income => SourceKind::Income,
            KindArg::Expense => SourceKind::Expense,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CashflowCmd {
    /// Daily and monthly totals, surplus/deficit and a suggestion.
    Summary,
    /// Each source's share of its total.
    Distribution {
        #[arg(value_enum)]
        kind: KindArg,
    },
    /// Income ranked largest first, expenses smallest first.
    Compare,
    /// Expense budgets: utilization and alerts.
    Alerts {
        #[arg(long)]
        threshold: Option<Decimal>,
    },
    /// Disposable income, savings and what is left to invest.
    Disposable,
}

#[derive(Debug, Args)]
pub struct CashflowArgs {
    #[command(subcommand)]
    pub cmd: CashflowCmd,
}

#[derive(Debug, Subcommand)]
pub enum DebtCmd {
    /// Debts in payoff priority order.
    List,
    /// Months to pay off a debt at a monthly payment, plus raised payments.
    Payoff { name: String, payment: Decimal },
    /// Extra payment suggestions from disposable income.
    Extra {
        /// Monthly disposable income. Defaults to the profile's.
        #[arg(long)]
        disposable: Option<Decimal>,
        #[arg(long)]
        fraction: Option<Decimal>,
    },
    /// Balance after each recorded payment.
    History,
    /// Chart data: current balance per debt, in priority order.
    Balances,
}

#[derive(Debug, Args)]
pub struct DebtArgs {
    #[command(subcommand)]
    pub cmd: DebtCmd,
}

#[derive(Debug, Subcommand)]
pub enum EmergencyCmd {
    Status {
        /// Monthly contribution. Defaults to the profile's.
        #[arg(long)]
        contribution: Option<Decimal>,
    },
    /// Cumulative savings per month until the goal.
    Trajectory {
        #[arg(long)]
        contribution: Option<Decimal>,
    },
}

#[derive(Debug, Args)]
pub struct EmergencyArgs {
    #[command(subcommand)]
    pub cmd: EmergencyCmd,
}

#[derive(Debug, Subcommand)]
pub enum HealthCmd {
    /// Health score and status.
    Score,
    /// Income vs expenses, savings capacity and debt vs savings.
    Summary,
    /// Bank accounts and other liquid assets.
    Accounts,
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[command(subcommand)]
    pub cmd: HealthCmd,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Months to project. Defaults to the config's forecast_months; must match
    /// the profile's planned expenses when any are listed.
    #[arg(long)]
    pub months: Option<usize>,
}
