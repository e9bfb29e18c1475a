use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregator::{MAX_DAYS, MAX_MONTHS};
use crate::error::{RampError, Result};

pub const PREDICTION_URL_ENV: &str = "BUDGETRAMP_PREDICTION_URL";
pub const PREDICTION_KEY_ENV: &str = "BUDGETRAMP_PREDICTION_KEY";
pub const DB_FILE: &str = "budgetramp.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub prediction_url: String,
    #[serde(default)]
    pub prediction_api_key: String,
    #[serde(default = "default_fetch_limit")]
    pub dashboard_fetch_limit: usize,
    #[serde(default = "default_revenue_days")]
    pub revenue_days: u32,
    #[serde(default = "default_dashboard_months")]
    pub dashboard_months: u32,
    #[serde(default = "default_report_months")]
    pub report_months: u32,
}

fn default_fetch_limit() -> usize {
    500
}

fn default_revenue_days() -> u32 {
    30
}

fn default_dashboard_months() -> u32 {
    6
}

fn default_report_months() -> u32 {
    12
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            prediction_url: String::new(),
            prediction_api_key: String::new(),
            dashboard_fetch_limit: default_fetch_limit(),
            revenue_days: default_revenue_days(),
            dashboard_months: default_dashboard_months(),
            report_months: default_report_months(),
        }
    }
}

impl Settings {
    /// Environment variables win over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(PREDICTION_URL_ENV) {
            if !url.trim().is_empty() {
                self.prediction_url = url;
            }
        }
        if let Ok(key) = std::env::var(PREDICTION_KEY_ENV) {
            if !key.trim().is_empty() {
                self.prediction_api_key = key;
            }
        }
        self
    }

    /// Replace out-of-range aggregation lengths with their defaults.
    fn bounded(mut self) -> Self {
        if self.revenue_days > MAX_DAYS {
            log::warn!("revenue_days {} exceeds {MAX_DAYS}; using default", self.revenue_days);
            self.revenue_days = default_revenue_days();
        }
        if self.dashboard_months > MAX_MONTHS {
            log::warn!("dashboard_months {} exceeds {MAX_MONTHS}; using default", self.dashboard_months);
            self.dashboard_months = default_dashboard_months();
        }
        if self.report_months > MAX_MONTHS {
            log::warn!("report_months {} exceeds {MAX_MONTHS}; using default", self.report_months);
            self.report_months = default_report_months();
        }
        self
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }

    pub fn exports_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("exports")
    }

    /// Endpoint and key, or an error naming what is missing.
    pub fn prediction_endpoint(&self) -> Result<(&str, &str)> {
        if self.prediction_url.trim().is_empty() {
            return Err(RampError::Settings(format!(
                "no prediction endpoint configured; set prediction_url in {} or {PREDICTION_URL_ENV}",
                settings_path().display()
            )));
        }
        Ok((&self.prediction_url, &self.prediction_api_key))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("budgetramp")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("budgetramp")
}

fn parse_settings(content: &str) -> Settings {
    match serde_json::from_str::<Settings>(content) {
        Ok(s) => s.bounded(),
        Err(e) => {
            log::warn!("ignoring unreadable settings file: {e}");
            Settings::default()
        }
    }
}

pub fn load_settings_from(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_settings(&content),
        Err(_) => Settings::default(),
    }
}

/// Settings file merged with defaults and environment overrides.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path()).with_env_overrides()
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| RampError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    let p = PathBuf::from(path);
    if p.is_absolute() {
        return path.to_string();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&p))
        .unwrap_or(p)
        .to_string_lossy()
        .to_string()
}
