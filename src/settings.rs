//! # Settings Module
//!
//! ## Purpose
//! Holds the configuration of the calculator: which balancing method is used, whether
//! formulae are parsed strictly, and how logging is set up. The configuration is stored
//! as JSON (chemcalc_config.json) and falls back to defaults when the file is missing.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "balance_method": "exact",
//!   "strict_formulas": false,
//!   "log_level": "info",
//!   "log_file": null
//! }
//! ```
//! The bounded search of small trial coefficients is selected with
//! `"balance_method": {"trial_scale": {"limit": 12, "max_denominator": 1000000}}`.
//!
//! ## Usage
//! ```rust
//! use ChemCalc::settings::CalcSettings;
//!
//! let settings = CalcSettings::load_or_default("no_such_config.json");
//! assert_eq!(settings, CalcSettings::default());
//! ```

use crate::Calculator::calc_errors::{CalcError, CalcOutcome};
use crate::Calculator::equation_balancer::BalanceMethod;
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "chemcalc_config.json";

/// Calculator configuration.
///
/// # Fields
/// * `balance_method` - exact null space search or the bounded trial-scale search
/// * `strict_formulas` - reject malformed formulae instead of skipping unknown characters
/// * `log_level` - one of off, error, warn, info, debug, trace
/// * `log_file` - optional file receiving a copy of the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalcSettings {
    pub balance_method: BalanceMethod,
    pub strict_formulas: bool,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for CalcSettings {
    fn default() -> Self {
        Self {
            balance_method: BalanceMethod::Exact,
            strict_formulas: false,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl CalcSettings {
    /// Loads configuration from a JSON file. A missing file gives the default configuration,
    /// an unreadable or invalid one is an error
    pub fn load(config_file: &str) -> CalcOutcome<Self> {
        if !Path::new(config_file).exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_file)
            .map_err(|e| CalcError::Config(format!("cannot read '{}': {}", config_file, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| CalcError::Config(format!("invalid '{}': {}", config_file, e)))
    }

    /// same as `load` but falls back to defaults on any error
    pub fn load_or_default(config_file: &str) -> Self {
        Self::load(config_file).unwrap_or_else(|e| {
            warn!("{}, using default settings", e);
            Self::default()
        })
    }

    /// Saves configuration as pretty-printed JSON
    pub fn save(&self, config_file: &str) -> CalcOutcome<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CalcError::Config(e.to_string()))?;
        fs::write(config_file, content)
            .map_err(|e| CalcError::Config(format!("cannot write '{}': {}", config_file, e)))
    }

    /// log level, Info when the configured name is not recognised
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = CalcSettings::default();
        assert_eq!(settings.balance_method, BalanceMethod::Exact);
        assert!(!settings.strict_formulas);
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = CalcSettings::load("definitely_missing_chemcalc_config.json").unwrap();
        assert_eq!(settings, CalcSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let settings = CalcSettings {
            balance_method: BalanceMethod::trial_scale(),
            strict_formulas: true,
            log_level: "debug".to_string(),
            log_file: Some("chemcalc.log".to_string()),
        };
        settings.save(&path).unwrap();
        let loaded = CalcSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_partial_and_invalid_files() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"strict_formulas": true}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let loaded = CalcSettings::load(&path).unwrap();
        assert!(loaded.strict_formulas);
        assert_eq!(loaded.balance_method, BalanceMethod::Exact);

        let mut broken = NamedTempFile::new().unwrap();
        write!(broken, "{{ not json").unwrap();
        let path = broken.path().to_str().unwrap().to_string();
        assert!(matches!(CalcSettings::load(&path), Err(CalcError::Config(_))));
        assert_eq!(CalcSettings::load_or_default(&path), CalcSettings::default());

        let settings = CalcSettings {
            log_level: "loud".to_string(),
            ..CalcSettings::default()
        };
        assert_eq!(settings.level_filter(), LevelFilter::Info);
    }
}
