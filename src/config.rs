//! Configuration module
//!
//! Loaded from a TOML file (default `~/.config/smart-parking/config.toml`).
//! Every section and field has a default, so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Category;
use crate::support::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub pools: PoolConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Root path of the parking document in the real-time database.
    pub root_path: String,
    /// Upper bound on a single booking write round trip.
    pub write_timeout_ms: u64,
}

impl FeedConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            root_path: "SmartParking".to_string(),
            write_timeout_ms: 10_000,
        }
    }
}

/// Number of spots per category. Ids run `1..=size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub cars: u32,
    pub bikes: u32,
    pub heavy_vehicles: u32,
}

impl PoolConfig {
    pub fn size(&self, category: Category) -> u32 {
        match category {
            Category::Car => self.cars,
            Category::Bike => self.bikes,
            Category::HeavyVehicle => self.heavy_vehicles,
        }
    }

    /// Default label for a spot whose sensor the feed did not name.
    ///
    /// Sensors are numbered across all pools in category order, so with the
    /// default pools cars get IR1..IR3, bikes IR4..IR6, heavy vehicles IR7..IR9.
    pub fn default_sensor_label(&self, category: Category, id: u32) -> String {
        let offset: u32 = Category::ALL
            .iter()
            .take_while(|&&c| c != category)
            .map(|&c| self.size(c))
            .sum();
        format!("IR{}", offset + id)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            cars: 3,
            bikes: 3,
            heavy_vehicles: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    /// text or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.root_path.trim().trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("feed.root_path must not be empty".into()));
        }
        if self.feed.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid("feed.write_timeout_ms must be > 0".into()));
        }
        for category in Category::ALL {
            if self.pools.size(category) == 0 {
                return Err(ConfigError::Invalid(format!(
                    "pool for {} must have at least one spot",
                    category
                )));
            }
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::Invalid("events.capacity must be > 0".into()));
        }
        Ok(())
    }
}

/// `~/.config/smart-parking/config.toml` (platform equivalent elsewhere).
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smart-parking")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.feed.root_path, "SmartParking");
        assert_eq!(cfg.feed.write_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.pools, PoolConfig::default());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [pools]
            cars = 10

            [feed]
            write_timeout_ms = 2500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.pools.cars, 10);
        assert_eq!(cfg.pools.bikes, 3);
        assert_eq!(cfg.feed.root_path, "SmartParking");
        assert_eq!(cfg.feed.write_timeout_ms, 2500);
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = AppConfig::from_toml_str("[pools]\nbikes = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[pools\ncars = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn sensor_labels_run_across_pools() {
        let pools = PoolConfig::default();
        assert_eq!(pools.default_sensor_label(Category::Car, 1), "IR1");
        assert_eq!(pools.default_sensor_label(Category::Bike, 1), "IR4");
        assert_eq!(pools.default_sensor_label(Category::HeavyVehicle, 3), "IR9");

        let wide = PoolConfig { cars: 5, ..PoolConfig::default() };
        assert_eq!(wide.default_sensor_label(Category::Bike, 2), "IR7");
    }
}
