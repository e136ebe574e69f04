//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "currency": "BRL",
//!   "utcOffsetMinutes": -180,
//!   "recordsFile": "lancamentos.csv"
//! }
//! ```
//! Keys this crate does not manage are kept as they are on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_CURRENCY;

/// Brasília time
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

pub const DEFAULT_RECORDS_FILE: &str = "lancamentos.csv";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utc_offset_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    records_file: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// ISO code stamped on new records
    pub currency: String,
    /// Offset used to decide what "today" is
    pub utc_offset_minutes: i32,
    /// Record sheet, relative to the data directory unless absolute
    pub records_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            records_file: DEFAULT_RECORDS_FILE.to_string(),
        }
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment overrides (for deployments and CI):
    /// `CAIXINHA_CURRENCY`, `CAIXINHA_UTC_OFFSET_MINUTES`
    pub fn load(dir: &Path) -> Result<Self> {
        let raw = read_settings(&dir.join(SETTINGS_FILE))?;
        let defaults = Self::default();

        let mut config = Self {
            currency: raw.currency.unwrap_or(defaults.currency),
            utc_offset_minutes: raw.utc_offset_minutes.unwrap_or(defaults.utc_offset_minutes),
            records_file: raw.records_file.unwrap_or(defaults.records_file),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.offset()?;

        Ok(config)
    }

    /// Apply `CAIXINHA_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(currency) = lookup("CAIXINHA_CURRENCY").filter(|c| !c.trim().is_empty()) {
            self.currency = currency.trim().to_uppercase();
        }
        if let Some(minutes) = lookup("CAIXINHA_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = minutes
                .trim()
                .parse()
                .map_err(|_| anyhow!("CAIXINHA_UTC_OFFSET_MINUTES is not a number: {minutes}"))?;
        }
        Ok(())
    }

    /// The configured offset, validated
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("UTC offset out of range: {} minutes", self.utc_offset_minutes))
    }

    /// Absolute path of the record sheet
    pub fn records_path(&self, dir: &Path) -> PathBuf {
        let file = Path::new(&self.records_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            dir.join(file)
        }
    }

    /// Save config to the data directory, keeping keys it does not manage
    pub fn save(&self, dir: &Path) -> Result<()> {
        let settings_path = dir.join(SETTINGS_FILE);
        let mut settings = read_settings(&settings_path)?;

        settings.currency = Some(self.currency.clone());
        settings.utc_offset_minutes = Some(self.utc_offset_minutes);
        settings.records_file = Some(self.records_file.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.apply_overrides(|_| None).unwrap();
        assert_eq!(config.currency, "BRL");
        assert_eq!(config.offset().unwrap().local_minus_utc(), -3 * 3600);
        assert_eq!(config.records_path(dir.path()), dir.path().join("lancamentos.csv"));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"currency":"USD","webhook":{"token":"x"}}"#).unwrap();

        let raw = read_settings(&path).unwrap();
        assert_eq!(raw.currency.as_deref(), Some("USD"));

        let config = Config {
            currency: "EUR".to_string(),
            ..Config::default()
        };
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["currency"], "EUR");
        assert_eq!(saved["utcOffsetMinutes"], -180);
        assert_eq!(saved["webhook"]["token"], "x");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(|key| match key {
                "CAIXINHA_CURRENCY" => Some(" usd ".to_string()),
                "CAIXINHA_UTC_OFFSET_MINUTES" => Some("0".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.utc_offset_minutes, 0);

        let mut bad = Config::default();
        assert!(bad
            .apply_overrides(|key| (key == "CAIXINHA_UTC_OFFSET_MINUTES").then(|| "tres".to_string()))
            .is_err());
    }

    #[test]
    fn test_offset_out_of_range() {
        let config = Config {
            utc_offset_minutes: 24 * 60,
            ..Config::default()
        };
        assert!(config.offset().is_err());

        for minutes in [i32::MAX, i32::MIN, 40_000_000] {
            let config = Config {
                utc_offset_minutes: minutes,
                ..Config::default()
            };
            assert!(config.offset().is_err(), "{minutes}");
        }
    }

    #[test]
    fn test_load_rejects_huge_offset() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"utcOffsetMinutes":2147483647}"#,
        )
        .unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_absolute_records_file() {
        let dir = tempdir().unwrap();
        let absolute = dir.path().join("outra").join("planilha.csv");
        let config = Config {
            records_file: absolute.to_string_lossy().into_owned(),
            ..Config::default()
        };
        assert_eq!(config.records_path(Path::new("/ignored")), absolute);
    }
}
