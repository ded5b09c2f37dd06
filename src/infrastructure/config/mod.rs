//! Infrastructure configuration modules.

pub mod logging;
pub mod settings;
pub mod tables;

pub use logging::LoggingConfig;
pub use settings::{Config, DatabaseConfig, DATABASE_URL_ENV, DEFAULT_DATABASE_URL};
pub use tables::{ColumnConfig, TableConfig};
