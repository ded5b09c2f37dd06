//! Mapped tables and the registry that owns them.

use std::fmt;

use super::column::Column;
use super::model::Model;
use super::value::ColumnType;
use crate::error::ValidationError;

/// A mapped entity: a table name and its ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Whether `column` is one of this table's columns: same table, name,
    /// type and constraints.
    pub fn owns(&self, column: &Column) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    /// Columns that callers fill in, i.e. everything but the primary key.
    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_primary_key())
    }

    /// Name and type of every column, in declaration order.
    pub fn column_types(&self) -> Vec<(&str, ColumnType)> {
        self.columns.iter().map(|c| (c.name(), c.ty())).collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The set of tables a database manages, in registration order.
///
/// A table counts as mapped only when a table with the same name and the
/// same columns was registered, so a look-alike model declared elsewhere is
/// still rejected.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tables: Vec<Table>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the table of model `M`.
    pub fn register<M: Model>(&mut self) -> Result<&mut Self, ValidationError> {
        self.register_table(M::table().clone())
    }

    /// Register a table. Registering an identical table twice is a no-op.
    pub fn register_table(&mut self, table: Table) -> Result<&mut Self, ValidationError> {
        match self.tables.iter().position(|t| t.name() == table.name()) {
            Some(index) if self.tables[index] == table => {}
            Some(_) => {
                return Err(ValidationError::ConflictingTable {
                    name: table.name().to_string(),
                })
            }
            None => self.tables.push(table),
        }
        Ok(self)
    }

    pub fn contains(&self, table: &Table) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
