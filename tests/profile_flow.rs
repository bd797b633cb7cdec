use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

fn finhealth_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("finhealth"))
}

fn cmd_with_profile(home: &tempfile::TempDir, profile: &Path) -> Command {
    let mut cmd = finhealth_cmd();
    cmd.env("FINHEALTH_HOME", home.path());
    cmd.env("FINHEALTH_PROFILE", profile);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run_ok_out(home: &tempfile::TempDir, profile: &Path, args: &[&str]) -> String {
    let mut cmd = cmd_with_profile(home, profile);
    cmd.args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).expect("utf8 stdout")
}

fn write_profile(home: &tempfile::TempDir, json: &str) -> std::path::PathBuf {
    let path = home.path().join("household.json");
    fs::write(&path, json).expect("write profile");
    path
}

#[test]
fn hand_written_profile_replays_payments() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(
        &home,
        r#"{
            "income": [{"name": "Pay", "amount": "3000", "frequency": "M"}],
            "expenses": [{"name": "Rent", "amount": "900", "frequency": "monthly"}],
            "debts": [
                {"name": "Card", "balance": "1000", "interest_rate": "20", "payments": ["300", "200"]},
                {"name": "Loan", "balance": "5000", "interest_rate": "6"}
            ]
        }"#,
    );

    let history = run_ok_out(&home, &profile, &["debt", "history"]);
    assert!(history.contains("| Card "));
    assert!(history.contains("| 1000.00 | 700.00 | 500.00 |"));
    assert!(history.contains("| Loan "));

    let list = run_ok_out(&home, &profile, &["debt", "list"]);
    assert!(list.contains("total\t5500.00"));
}

#[test]
fn profile_flag_overrides_env() {
    let home = tempfile::tempdir().expect("tempdir");
    let env_profile = write_profile(&home, r#"{"budget": {"income": "100"}}"#);
    let flag_profile = home.path().join("other.json");
    fs::write(
        &flag_profile,
        r#"{"budget": {"income": "500", "categories": [{"name": "Food", "allocated": "200"}]}}"#,
    )
    .expect("write profile");

    let out = run_ok_out(
        &home,
        &env_profile,
        &["--profile", flag_profile.to_str().expect("utf8 path"), "budget", "report"],
    );
    assert!(out.contains("| Food "));
    assert!(out.contains("income\t500.00"));
}

#[test]
fn invalid_entries_are_named_in_the_error() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(
        &home,
        r#"{"budget": {"income": "100", "categories": [{"name": "Rent", "allocated": "150"}]}}"#,
    );

    let mut cmd = cmd_with_profile(&home, &profile);
    cmd.args(["budget", "report"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("budget category entry 'Rent'"))
        .stderr(predicate::str::contains("exceeds income"));
}

#[test]
fn forecast_without_history_fails() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(&home, "{}");

    let mut cmd = cmd_with_profile(&home, &profile);
    cmd.arg("forecast");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No historical periods recorded"));
}

#[test]
fn empty_profile_reports_gracefully() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(&home, "{}");

    let budget = run_ok_out(&home, &profile, &["budget", "report"]);
    assert!(budget.contains("(no budget categories)"));

    let debts = run_ok_out(&home, &profile, &["debt", "list"]);
    assert!(debts.contains("(no debts)"));

    let accounts = run_ok_out(&home, &profile, &["health", "accounts"]);
    assert!(accounts.contains("No bank accounts or liquid assets to display."));

    let summary = run_ok_out(&home, &profile, &["cashflow", "summary"]);
    assert!(summary.contains("Break-even: Your income matches your expenses."));
}

#[test]
fn malformed_json_is_reported_with_path() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(&home, "{ not json");

    let mut cmd = cmd_with_profile(&home, &profile);
    cmd.args(["health", "score"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"))
        .stderr(predicate::str::contains("household.json"));
}

#[test]
fn amounts_are_rounded_not_truncated() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(
        &home,
        r#"{"expenses": [{"name": "Rent", "amount": "1000", "frequency": "W"}]}"#,
    );

    let summary = run_ok_out(&home, &profile, &["cashflow", "summary"]);
    assert!(summary.contains("| 142.86 "));
    assert!(summary.contains("Deficit: You are overspending by $142.86 per day."));
    assert!(summary.contains("Rent, which accounts for $142.86 daily."));
}

#[test]
fn oversized_amounts_fail_cleanly() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(
        &home,
        r#"{"expenses": [{"name": "Big", "amount": "79228162514264337593543950335", "frequency": "D"}]}"#,
    );

    let mut cmd = cmd_with_profile(&home, &profile);
    cmd.args(["health", "score"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("cash-flow source entry 'Big'"))
        .stderr(predicate::str::contains("above the supported maximum"));

    let profile = write_profile(
        &home,
        r#"{"debts": [{"name": "Card", "balance": "1000", "interest_rate": "20"}]}"#,
    );
    let mut cmd = cmd_with_profile(&home, &profile);
    cmd.args(["debt", "payoff", "Card", "79228162514264337593543950335"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("above the supported maximum"));
}

#[test]
fn chart_series_commands() {
    let home = tempfile::tempdir().expect("tempdir");
    let profile = write_profile(
        &home,
        r#"{
            "budget": {"income": "1000", "categories": [
                {"name": "Food", "allocated": "300", "consumed": "120"},
                {"name": "Rent", "allocated": "500", "consumed": "500"}
            ]},
            "debts": [
                {"name": "Card", "balance": "1000", "interest_rate": "20", "payments": ["250"]},
                {"name": "Loan", "balance": "5000", "interest_rate": "6"}
            ]
        }"#,
    );

    let allocated = run_ok_out(&home, &profile, &["budget", "chart"]);
    assert!(allocated.contains("| category | allocated |"));
    assert!(allocated.contains("| Food     | 300.00    |"));

    let consumed = run_ok_out(&home, &profile, &["budget", "chart", "--consumed"]);
    assert!(consumed.contains("| Food     | 120.00   |"));

    let report = run_ok_out(&home, &profile, &["budget", "report"]);
    assert!(report.contains("consumed\t620.00"));

    let balances = run_ok_out(&home, &profile, &["debt", "balances"]);
    let card = balances.find("| Card | 750.00").expect("card row");
    let loan = balances.find("| Loan | 5000.00").expect("loan row");
    assert!(card < loan);
}
