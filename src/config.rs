use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Utilization (percent) at which a budget counts as "approaching".
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold_percent: Decimal,

    /// Share of disposable income suggested as extra debt payment.
    #[serde(default = "default_extra_payment_fraction")]
    pub extra_payment_fraction: Decimal,

    /// Payment increases (percent) shown next to a payoff estimate.
    #[serde(default = "default_payoff_adjustments")]
    pub payoff_adjustments: Vec<Decimal>,

    #[serde(default = "default_forecast_months")]
    pub forecast_months: usize,

    /// Expense sources left out of disposable income.
    #[serde(default = "default_essential_categories")]
    pub essential_categories: Vec<String>,

    /// Profile used when `--profile` is not given. Defaults to
    /// `<data dir>/profile.json`.
    #[serde(default)]
    pub profile_path: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default = "now_utc")]
    pub created_at: DateTime<Utc>,
}

fn default_alert_threshold() -> Decimal {
    dec!(80)
}

fn default_extra_payment_fraction() -> Decimal {
    dec!(0.2)
}

fn default_payoff_adjustments() -> Vec<Decimal> {
    vec![dec!(10), dec!(20), dec!(30)]
}

fn default_forecast_months() -> usize {
    6
}

fn default_essential_categories() -> Vec<String> {
    ["Rent", "Utilities", "Debt Payments", "Groceries", "Transportation"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_filter() -> String {
    "finhealth=warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            alert_threshold_percent: default_alert_threshold(),
            extra_payment_fraction: default_extra_payment_fraction(),
            payoff_adjustments: default_payoff_adjustments(),
            forecast_months: default_forecast_months(),
            essential_categories: default_essential_categories(),
            profile_path: None,
            log_filter: default_log_filter(),
            created_at: now_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    pub fn default_profile(&self) -> PathBuf {
        self.data_dir.join("profile.json")
    }
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
            data_dir: home.join("data"),
        });
    }

    let proj = ProjectDirs::from("com", "finhealth", "finhealth")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
        data_dir: proj.data_dir().to_path_buf(),
    })
}

/// Loads `config.json`, creating it on first run. Keys missing from an older
/// file are written back with their defaults and returned so the caller can
/// report them once logging is up.
pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf, Vec<String>)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;

    let cfg_path = paths.config_dir.join("config.json");
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        return Ok((cfg, cfg_path, Vec::new()));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;
    let cfg: AppConfig = serde_json::from_value(value.clone())
        .with_context(|| format!("Invalid config in {}", cfg_path.display()))?;

    let filled = serde_json::to_value(&cfg)?;
    let missing: Vec<String> = match (value.as_object(), filled.as_object()) {
        (Some(old), Some(new)) => new.keys().filter(|k| !old.contains_key(*k)).cloned().collect(),
        _ => Vec::new(),
    };
    if !missing.is_empty() {
        write_config(&cfg_path, &cfg)?;
    }

    Ok((cfg, cfg_path, missing))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
