//! Configuration module
//!
//! Settings come from a TOML file (default ~/.config/aquabill/config.toml,
//! overridable with AQUABILL_CONFIG). Every section and field has a default
//! so a partial file, or none at all, still yields a runnable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub billing: BillingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite database file path
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "./aquabill.db".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (e.g. "info", "aquabill=debug")
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    /// Carry the new total as an outstanding balance when closing a cycle.
    /// When false, closure marks the meter paid and zeroes the balance.
    pub carry_balance: bool,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            carry_balance: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Default configuration file location (~/.config/aquabill/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aquabill")
        .join("config.toml")
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.database.path, "./aquabill.db");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.billing.carry_balance);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            path = "/var/lib/aquabill/billing.db"

            [billing]
            carry_balance = false
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.database.connection_url(),
            "sqlite:///var/lib/aquabill/billing.db?mode=rwc"
        );
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.billing.carry_balance);
    }

    #[test]
    fn unknown_level_is_kept_verbatim() {
        let cfg: AppConfig = toml::from_str("[logging]\nlevel = \"aquabill=trace\"").unwrap();
        assert_eq!(cfg.logging.level, "aquabill=trace");
    }
}
