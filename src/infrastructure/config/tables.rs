//! Tables declared in the configuration file.
//!
//! ```toml
//! [[tables]]
//! name = "users"
//!
//! [[tables.columns]]
//! name = "email"
//! type = "text"
//!
//! [[tables.columns]]
//! name = "age"
//! type = "integer"
//! nullable = true
//! ```
//!
//! Tables are standard by default: they get `id`, `created_at` and
//! `updated_at` ahead of the declared columns.

use serde::Deserialize;

use crate::adapter::outbound::sql::validate_identifier;
use crate::domain::model::{standard_columns, STANDARD_COLUMN_NAMES};
use crate::domain::{Column, ColumnType, Table};
use crate::error::ConfigError;

fn default_standard() -> bool {
    true
}

/// One `[[tables]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    pub name: String,
    #[serde(default = "default_standard")]
    pub standard: bool,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

/// One `[[tables.columns]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

fn invalid(table: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: "tables",
        reason: format!("{table}: {}", reason.into()),
    }
}

impl TableConfig {
    /// Build the mapped table.
    ///
    /// # Errors
    /// Rejects unsafe identifiers, duplicate columns, columns that clash with
    /// the standard ones, and tables without columns.
    pub fn to_table(&self) -> Result<Table, ConfigError> {
        validate_identifier("table", &self.name).map_err(|e| invalid(&self.name, e.to_string()))?;

        let mut columns = if self.standard {
            standard_columns(&self.name)
        } else {
            Vec::new()
        };

        for config in &self.columns {
            validate_identifier("column", &config.name)
                .map_err(|e| invalid(&self.name, e.to_string()))?;
            if self.standard && STANDARD_COLUMN_NAMES.contains(&config.name.as_str()) {
                return Err(invalid(
                    &self.name,
                    format!("column `{}` is provided by the standard model", config.name),
                ));
            }
            if self.standard && config.primary_key {
                return Err(invalid(
                    &self.name,
                    "standard tables use `id` as their primary key",
                ));
            }
            if columns.iter().any(|c: &Column| c.name() == config.name) {
                return Err(invalid(&self.name, format!("duplicate column `{}`", config.name)));
            }
            let column = Column::new(&self.name, &config.name, config.ty);
            columns.push(if config.primary_key {
                column.primary_key()
            } else {
                column.nullable(config.nullable)
            });
        }

        if columns.is_empty() {
            return Err(invalid(&self.name, "a table needs at least one column"));
        }
        Ok(Table::new(&self.name, columns))
    }
}
