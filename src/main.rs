mod cli;
mod config;
mod report;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use finhealth::cashflow::{DAYS_PER_MONTH, SourceKind};
use finhealth::health::HealthScorer;
use finhealth::profile::{Household, Profile};

use crate::cli::{
    BudgetCmd, CashflowCmd, Cli, Command, ConfigCmd, DebtCmd, EmergencyCmd, HealthCmd,
};
use crate::config::{AppConfig, app_paths, load_or_init_config};
use crate::report::{money, percent, print_series, print_table};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = app_paths(cli.home.clone())?;
    let (cfg, cfg_path, filled_keys) = load_or_init_config(&paths)?;
    finhealth::init_tracing(&cfg.log_filter);
    if !filled_keys.is_empty() {
        tracing::info!(path = %cfg_path.display(), keys = ?filled_keys, "filled missing config keys");
    }

    let profile_path = cli
        .profile
        .clone()
        .or_else(|| cfg.profile_path.clone())
        .unwrap_or_else(|| paths.default_profile());

    let household = || -> Result<Household> {
        let profile = load_profile(&profile_path)?;
        Household::from_profile(&profile)
            .with_context(|| format!("Invalid profile {}", profile_path.display()))
    };

    match cli.command {
        Command::Init(args) => handle_init(&profile_path, args.force),
        Command::Config(args) => {
            match args.cmd {
                ConfigCmd::Show => println!("{}", serde_json::to_string_pretty(&cfg)?),
                ConfigCmd::Path => println!("{}", cfg_path.display()),
            }
            Ok(())
        }
        Command::Budget(args) => handle_budget(&household()?, &cfg, args.cmd),
        Command::Cashflow(args) => handle_cashflow(&household()?, &cfg, args.cmd),
        Command::Debt(args) => handle_debt(&household()?, &cfg, args.cmd),
        Command::Emergency(args) => handle_emergency(&household()?, args.cmd),
        Command::Health(args) => handle_health(&household()?, args.cmd),
        Command::Forecast(args) => handle_forecast(
            &household()?,
            args.months.unwrap_or(cfg.forecast_months),
        ),
    }
}

fn handle_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "Profile already exists at {}. Use --force to overwrite it.",
            path.display()
        ));
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(&Profile::sample())?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote sample profile to {}", path.display());
    Ok(())
}

fn load_profile(path: &Path) -> Result<Profile> {
    if !path.exists() {
        return Err(anyhow!(
            "No profile at {}. Create one with: finhealth init",
            path.display()
        ));
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn handle_budget(household: &Household, cfg: &AppConfig, cmd: BudgetCmd) -> Result<()> {
    let budget = &household.budget;
    match cmd {
        BudgetCmd::Report {
            categories,
            no_total,
        } => {
            if budget.categories().is_empty() {
                println!("(no budget categories)");
                return Ok(());
            }

            let only: Vec<&str> = categories.iter().map(String::as_str).collect();
            let rows: Vec<Vec<String>> = budget
                .breakdown(&only, !no_total)
                .into_iter()
                .map(|row| {
                    let utilization = finhealth::domain::percent_of(row.consumed, row.allocated)
                        .map(percent)
                        .unwrap_or_else(|| "n/a".to_string());
                    vec![
                        row.label,
                        money(row.allocated),
                        money(row.consumed),
                        money(row.allocated - row.consumed),
                        utilization,
                    ]
                })
                .collect();
            print_table(
                &["category", "allocated", "consumed", "remaining", "utilization"],
                &rows,
            );

            println!();
            println!("income\t{}", money(budget.income()));
            println!("consumed\t{}", money(budget.total_consumed()));
            println!("unallocated\t{}", money(budget.unallocated()));
            match budget.allocation_share() {
                Ok((allocated, rest)) => {
                    println!("budgeted\t{}\tof income", percent(allocated));
                    println!("remaining\t{}\tof income", percent(rest));
                }
                Err(err) => println!("budgeted\t{err}"),
            }

            let (on, off) = budget.partition_on_off_budget();
            println!("on budget\t{}", join_names(on.iter().map(|n| n.as_str())));
            println!("off budget\t{}", join_names(off.iter().map(|n| n.as_str())));
            Ok(())
        }
        BudgetCmd::Alerts { threshold } => {
            let threshold = threshold.unwrap_or(cfg.alert_threshold_percent);
            let (_, over) = budget.partition_by_utilization(threshold);
            if over.is_empty() {
                println!("No categories at or above {}.", percent(threshold));
                return Ok(());
            }
            let rows: Vec<Vec<String>> = over
                .iter()
                .map(|name| {
                    let utilization = budget
                        .utilization(name.as_str())
                        .map(percent)
                        .unwrap_or_else(|_| "no allocation".to_string());
                    vec![name.to_string(), utilization]
                })
                .collect();
            print_table(&["category", "utilization"], &rows);
            Ok(())
        }
        BudgetCmd::Chart { consumed } => {
            if consumed {
                print_series("category", "consumed", &budget.consumed_series());
            } else {
                print_series("category", "allocated", &budget.allocation_series());
            }
            Ok(())
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

fn handle_cashflow(household: &Household, cfg: &AppConfig, cmd: CashflowCmd) -> Result<()> {
    let cashflow = &household.cashflow;
    match cmd {
        CashflowCmd::Summary => {
            let rows: Vec<Vec<String>> = [SourceKind::Income, SourceKind::Expense]
                .into_iter()
                .map(|kind| {
                    vec![
                        kind.to_string(),
                        money(cashflow.total(kind)),
                        money(cashflow.monthly_total(kind)),
                    ]
                })
                .collect();
            print_table(&["kind", "daily", "monthly"], &rows);
            println!();
            println!("{}", cashflow.cash_flow_status());
            println!(
                "{}",
                cashflow.suggest_adjustment(
                    cashflow.total(SourceKind::Income),
                    cashflow.total(SourceKind::Expense)
                )
            );
            Ok(())
        }
        CashflowCmd::Distribution { kind } => {
            let kind = SourceKind::from(kind);
            let distribution = cashflow.distribution(kind);
            if distribution.is_empty() {
                println!("(no {kind} to distribute)");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = distribution
                .iter()
                .map(|(name, pct)| {
                    let entry = &cashflow.sources(kind)[name];
                    vec![
                        name.to_string(),
                        money(entry.nominal_amount),
                        entry.frequency.to_string(),
                        money(entry.daily_equivalent),
                        percent(*pct),
                    ]
                })
                .collect();
            print_table(&["source", "amount", "freq", "daily", "share"], &rows);
            Ok(())
        }
        CashflowCmd::Compare => {
            print_series("income", "daily", &cashflow.ranked_sources(SourceKind::Income));
            println!();
            print_series("expense", "daily", &cashflow.ranked_sources(SourceKind::Expense));
            Ok(())
        }
        CashflowCmd::Alerts { threshold } => {
            let usage = cashflow.budget_utilization();
            if usage.is_empty() {
                println!("(no expense budgets)");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = usage
                .iter()
                .map(|u| vec![u.name.to_string(), money(u.budget), percent(u.utilized)])
                .collect();
            print_table(&["expense", "budget", "utilized"], &rows);

            let alerts =
                cashflow.budget_alerts(threshold.unwrap_or(cfg.alert_threshold_percent));
            if !alerts.is_empty() {
                println!();
            }
            for alert in alerts {
                println!("{alert}");
            }
            Ok(())
        }
        CashflowCmd::Disposable => {
            let summary = cashflow.disposable_summary(&cfg.essential_categories);
            println!("Total Disposable Income: ${}", money(summary.disposable));
            println!("Savings Contributions: ${}", money(summary.savings));
            println!("Money Left to Invest: ${}", money(summary.investable));
            println!("{}", summary.suggestion());
            Ok(())
        }
    }
}

fn handle_debt(household: &Household, cfg: &AppConfig, cmd: DebtCmd) -> Result<()> {
    let debts = &household.debts;
    match cmd {
        DebtCmd::List => {
            let ordered = debts.prioritize();
            if ordered.is_empty() {
                println!("(no debts)");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = ordered
                .iter()
                .enumerate()
                .map(|(i, (name, d))| {
                    vec![
                        (i + 1).to_string(),
                        name.to_string(),
                        money(d.balance),
                        percent(d.interest_rate),
                        d.urgency.to_string(),
                        money(d.monthly_interest()),
                    ]
                })
                .collect();
            print_table(
                &["#", "debt", "balance", "rate", "urgency", "interest/mo"],
                &rows,
            );
            println!();
            println!("total\t{}", money(debts.total_balance()));
            Ok(())
        }
        DebtCmd::Payoff { name, payment } => {
            let months = debts.payoff_months(&name, payment)?;
            println!(
                "Payoff time for {name} with a monthly payment of ${} is approximately {months} months.",
                money(payment)
            );

            let adjusted = debts.adjusted_payoffs(&name, payment, &cfg.payoff_adjustments)?;
            let rows: Vec<Vec<String>> = adjusted
                .into_iter()
                .map(|a| {
                    let months = match a.months {
                        Ok(m) => m.to_string(),
                        Err(err) => err.to_string(),
                    };
                    vec![format!("+{}%", a.increase_percent), money(a.payment), months]
                })
                .collect();
            println!();
            print_table(&["increase", "payment", "months"], &rows);
            Ok(())
        }
        DebtCmd::Extra {
            disposable,
            fraction,
        } => {
            let disposable = disposable.unwrap_or_else(|| {
                household.cashflow.disposable_income(&cfg.essential_categories) * DAYS_PER_MONTH
            });
            let fraction = fraction.unwrap_or(cfg.extra_payment_fraction);
            let suggestions = debts.suggest_extra_payment(disposable, fraction)?;
            if suggestions.is_empty() {
                println!("No outstanding debts to pay extra on.");
                return Ok(());
            }
            for s in suggestions {
                println!(
                    "Extra payment of ${} towards {} could save you around ${} in interest this month.",
                    money(s.extra),
                    s.name,
                    money(s.interest_saved)
                );
            }
            Ok(())
        }
        DebtCmd::History => {
            let table = debts.progress_table();
            if table.is_empty() {
                println!("(no debts)");
                return Ok(());
            }
            let width = table.first().map(|(_, row)| row.len()).unwrap_or(0);
            let mut headers = vec!["debt".to_string()];
            headers.extend((0..width).map(|i| format!("#{i}")));
            let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

            let rows: Vec<Vec<String>> = table
                .into_iter()
                .map(|(name, row)| {
                    std::iter::once(name.to_string())
                        .chain(row.into_iter().map(|v| v.map(money).unwrap_or_default()))
                        .collect()
                })
                .collect();
            print_table(&header_refs, &rows);
            Ok(())
        }
        DebtCmd::Balances => {
            print_series("debt", "balance", &debts.balance_series());
            Ok(())
        }
    }
}

fn handle_emergency(household: &Household, cmd: EmergencyCmd) -> Result<()> {
    let fund = &household.emergency_fund;
    match cmd {
        EmergencyCmd::Status { contribution } => {
            println!("goal\t{}", money(fund.goal()));
            println!("saved\t{}", money(fund.progress()));
            println!("remaining\t{}", money(fund.remaining()));
            match fund.progress_percent() {
                Ok(pct) => println!("progress\t{pct}%"),
                Err(err) => println!("progress\t{err}"),
            }
            if let Some(contribution) = contribution.or(household.emergency_contribution) {
                let months = fund.months_to_goal(contribution)?;
                println!(
                    "At ${} per month you reach the goal in {months} months.",
                    money(contribution)
                );
            }
            Ok(())
        }
        EmergencyCmd::Trajectory { contribution } => {
            let contribution = contribution
                .or(household.emergency_contribution)
                .context("No monthly contribution; pass --contribution or set emergency_fund.monthly_contribution")?;
            let series = fund.savings_trajectory(contribution)?;
            print_series("month", "saved", &series);
            Ok(())
        }
    }
}

fn handle_health(household: &Household, cmd: HealthCmd) -> Result<()> {
    let mut scorer = household.health_scorer()?;
    match cmd {
        HealthCmd::Score => {
            let score = scorer.score();
            let status = HealthScorer::status(score);
            println!("Financial Health Score: {score}");
            println!("Status: {status}");
            println!("{}", status.recommendation());
            Ok(())
        }
        HealthCmd::Summary => {
            let status = scorer.income_expense_status();
            print_table(
                &["", "monthly"],
                &[
                    vec!["income".to_string(), money(scorer.monthly_income())],
                    vec!["expenses".to_string(), money(scorer.monthly_expenses())],
                ],
            );
            println!();
            println!("Status: {status}");
            println!("{}", status.message());
            println!("{}", status.recommendation());

            println!();
            match scorer.savings_capacity() {
                Ok(capacity) => {
                    println!("Savings capacity: {}", percent(capacity));
                    println!("{}", HealthScorer::savings_recommendation(capacity));
                }
                Err(err) => println!("Savings capacity: {err}"),
            }

            println!();
            println!("Total Debts: ${}", money(scorer.total_debts()));
            println!(
                "Total Savings & Assets: ${}",
                money(scorer.savings() + scorer.liquid_assets())
            );
            println!("{}", scorer.debt_vs_savings());
            Ok(())
        }
        HealthCmd::Accounts => {
            let series = scorer.liquid_asset_series();
            if series.is_empty() {
                println!("No bank accounts or liquid assets to display.");
                return Ok(());
            }
            print_series("account", "balance", &series);
            println!();
            println!("Total Liquid Assets: ${}", money(scorer.total_liquid_assets()));
            Ok(())
        }
    }
}

fn handle_forecast(household: &Household, months: usize) -> Result<()> {
    let forecaster = &household.forecaster;
    let planned = if household.planned_expenses.is_empty() {
        vec![Decimal::ZERO; months]
    } else {
        household.planned_expenses.clone()
    };

    let projection = forecaster.forecast(months)?;
    let planned_projection = forecaster.forecast_with_planned(months, &planned)?;

    let rows: Vec<Vec<String>> = (0..months)
        .map(|i| {
            vec![
                (i + 1).to_string(),
                money(projection.income[i]),
                money(planned_projection.adjusted_expenses[i]),
                money(planned_projection.disposable_income[i]),
            ]
        })
        .collect();
    print_table(&["month", "income", "expenses", "disposable"], &rows);

    let alerts = forecaster.deficit_alerts(months, &planned)?;
    if !alerts.is_empty() {
        println!();
    }
    for alert in alerts {
        println!("{alert}");
    }
    Ok(())
}
