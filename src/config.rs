use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StockroomError};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database file and pool settings
    pub database: DatabaseConfig,
    /// Log level, format and optional file
    pub logging: LoggingConfig,
    /// Inventory behaviour
    pub inventory: InventoryConfig,
    /// Export defaults
    pub export: ExportConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,
    /// Pool size
    pub max_connections: u32,
    /// Pool checkout and SQLite busy timeout
    pub connection_timeout_secs: u64,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    pub level: String,
    /// Daily rolling JSON log file
    pub file_path: Option<String>,
    /// Console format
    pub format: String, // "json" or "text"
}

/// `[inventory]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Quantity at which a stock alert is raised
    pub alert_threshold: i32,
}

/// `[export]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `txt`, `csv` or `json`
    pub default_format: String,
    /// Directory export files are written to
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "data/inventory.db".to_string(),
                max_connections: 4,
                connection_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            inventory: InventoryConfig { alert_threshold: 0 },
            export: ExportConfig {
                default_format: "csv".to_string(),
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Defaults, then `config/default` and `config/local`, then `explicit`
    /// if given, then `STOCKROOM__SECTION__KEY` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("STOCKROOM").separator("__").try_parsing(true))
            .build()
            .map_err(|e| StockroomError::InvalidConfig(format!("Failed to load configuration: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| StockroomError::InvalidConfig(format!("Failed to deserialize configuration: {e}")))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(invalid("database.path must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(invalid("connection_timeout_secs must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(&format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(&format!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format, valid_formats
            )));
        }

        let valid_formats = ["txt", "csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(invalid(&format!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format, valid_formats
            )));
        }

        Ok(())
    }

    /// Database file path, with `STOCKROOM_DB` taking precedence
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        std::env::var("STOCKROOM_DB").map_or_else(|_| PathBuf::from(&self.database.path), PathBuf::from)
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

fn invalid(message: &str) -> StockroomError {
    StockroomError::InvalidConfig(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, "data/inventory.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.inventory.alert_threshold, 0);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
