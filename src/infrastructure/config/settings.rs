//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from an optional TOML file; the database URL can
//! be overridden with `ORMKIT_DATABASE_URL`.
//!
//! # Example
//!
//! ```no_run
//! use ormkit::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("ormkit.toml")?;
//!     config.logging.init();
//!     let registry = config.registry()?;
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::tables::TableConfig;
use crate::adapter::outbound::database::{DatabaseUrl, DEFAULT_POOL_SIZE};
use crate::domain::Registry;
use crate::error::{ConfigError, Result};

/// Environment variable overriding the configured database URL.
pub const DATABASE_URL_ENV: &str = "ORMKIT_DATABASE_URL";

/// URL used when neither flag, environment nor file names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///ormkit.db";

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum pooled connections. In-memory SQLite always uses one.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Tables managed by the command line tool.
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise use the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pick the database URL: an explicit value first, then
    /// `ORMKIT_DATABASE_URL`, then the file, then [`DEFAULT_DATABASE_URL`].
    pub fn database_url(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(DATABASE_URL_ENV).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.database.url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    /// Registry of the declared tables, in declaration order.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();
        for table in &self.tables {
            let table = table.to_table()?;
            if registry.table(table.name()).is_some() {
                return Err(ConfigError::InvalidValue {
                    field: "tables",
                    reason: format!("table `{}` is declared twice", table.name()),
                }
                .into());
            }
            registry.register_table(table)?;
        }
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if let Some(url) = &self.database.url {
            DatabaseUrl::parse(url)?;
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected `pretty` or `json`, got `{}`", self.logging.format),
            }
            .into());
        }
        self.registry()?;
        Ok(())
    }
}
