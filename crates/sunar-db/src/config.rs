//! # Shop Configuration
//!
//! Configuration for the shop, its database and the starting rate table.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SUNAR_DB_PATH=/data/sunar.db                                       │
//! │     SUNAR_SHOP_NAME="Noor Jewellers"                                   │
//! │     SUNAR_GOLD_RATE_24K=24500                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sunar-ledger/shop.toml (Linux)                           │
//! │     ~/Library/Application Support/com.sunar.ledger/shop.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shop.toml
//! [shop]
//! name = "Noor Jewellers"
//! currency_symbol = "Rs."
//!
//! [database]
//! path = "/var/lib/sunar/sunar.db"
//! max_connections = 5
//!
//! [rates]
//! gold_24k = 24500.0
//! gold_21k = 21300.0   # optional per-karat override
//! silver = 280.0
//! ```
//!
//! The `[rates]` table only seeds `rate_settings`; once rates have been
//! saved through [`crate::RateRepository`], the stored row wins.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sunar_core::RateTable;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::pool::DbConfig;

// =============================================================================
// Shop Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    #[serde(default = "default_shop_name")]
    pub name: String,

    /// Printed before amounts on invoices and statements.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_shop_name() -> String {
    "Sunar Jewellers".to_string()
}

fn default_currency_symbol() -> String {
    "Rs.".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            name: default_shop_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `sunar.db` in the platform data directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "sunar", "ledger")
        .map(|dirs| dirs.data_dir().join("sunar.db"))
        .unwrap_or_else(|| PathBuf::from("sunar.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Main Shop Configuration
// =============================================================================

/// Complete shop configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    /// Starting rate table, used until rates are saved in the database.
    #[serde(default)]
    pub rates: RateTable,
}

impl ShopConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shop.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shop config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a `shop.toml` document.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Shop config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::Invalid("shop.name must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.rates.validate()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("SUNAR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(name) = std::env::var("SUNAR_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Ok(rate) = std::env::var("SUNAR_GOLD_RATE_24K") {
            match rate.parse::<f64>() {
                Ok(r) => {
                    debug!(rate = r, "Overriding 24k gold rate from environment");
                    self.rates.gold_24k = r;
                }
                Err(_) => warn!(rate = %rate, "Ignoring unparseable SUNAR_GOLD_RATE_24K"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sunar", "ledger")
            .map(|dirs| dirs.config_dir().join("shop.toml"))
    }

    /// Pool configuration for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .fallback_rates(self.rates)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sunar_core::Karat;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShopConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shop.currency_symbol, "Rs.");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = ShopConfig::from_toml(
            r#"
            [shop]
            name = "Noor Jewellers"

            [rates]
            gold_24k = 24000.0
            gold_21k = 21300.0
            "#,
        )
        .unwrap();

        assert_eq!(config.shop.name, "Noor Jewellers");
        assert_eq!(config.shop.currency_symbol, "Rs.");
        assert_eq!(config.rates.gold_rate(Karat::K21), 21_300.0);
        assert_eq!(config.rates.gold_rate(Karat::K22), 22_000.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ShopConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ShopConfig::default();
        config.rates.silver = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRates(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("sunar-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("shop.toml");

        let mut config = ShopConfig::default();
        config.shop.name = "Zewar Mahal".to_string();
        config.rates = RateTable::from_gold_24k(23_000.0);
        config.save(Some(path.clone())).unwrap();

        let loaded = ShopConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.shop.name, "Zewar Mahal");
        assert_eq!(loaded.rates.gold_24k, 23_000.0);

        std::fs::remove_dir_all(dir).ok();
    }
}
