//! Checks run on models, columns and clauses before any statement is built.
//!
//! Every facade operation funnels its inputs through these functions. They
//! never touch the database; a failure means the call was malformed.

use crate::domain::{Column, Filter, Order, Record, Registry, Table, Value};
use crate::error::ValidationError;

/// Title used for problems found in conditions.
pub const FILTER_TITLE: &str = "Checking filter: ";

/// Title used for problems found in ordering clauses.
pub const ORDER_TITLE: &str = "Checking order_by: ";

/// Every table must be mapped in `registry`.
pub fn models(registry: &Registry, tables: &[&Table]) -> Result<(), ValidationError> {
    let unmapped: Vec<String> = tables
        .iter()
        .enumerate()
        .filter(|(_, table)| !registry.contains(table))
        .map(|(i, table)| format!("{i} - ({})", table.name()))
        .collect();
    if unmapped.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnmappedModels { models: unmapped })
    }
}

/// `table` must be mapped in `registry`.
pub fn model(registry: &Registry, table: &Table) -> Result<(), ValidationError> {
    models(registry, &[table])
}

/// Every column must belong to `table`.
pub fn columns_same_model<'a>(
    table: &Table,
    columns: impl IntoIterator<Item = &'a Column>,
    title: &str,
) -> Result<(), ValidationError> {
    let mut foreign: Vec<String> = Vec::new();
    for column in columns {
        let name = column.qualified_name();
        if !table.owns(column) && !foreign.contains(&name) {
            foreign.push(name);
        }
    }
    if foreign.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::ForeignColumns {
            title: title.to_string(),
            model: table.name().to_string(),
            columns: foreign,
        })
    }
}

/// Primary key columns of `table` must be absent or `NULL` in `record`.
pub fn primary_key_no_values(
    table: &Table,
    record: &Record,
    context: &str,
) -> Result<(), ValidationError> {
    let assigned: Vec<String> = table
        .primary_key()
        .filter(|pk| record.get(pk.name()).is_some_and(|v| !v.is_null()))
        .map(|pk| pk.name().to_string())
        .collect();
    if assigned.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::PrimaryKeyAssigned {
            columns: assigned,
            context: context.to_string(),
        })
    }
}

/// Each value must fit its column: `NULL` only where the column is nullable,
/// otherwise a value of the column's type.
pub fn columns_values_are_same_type<'a>(
    pairs: impl IntoIterator<Item = (&'a Column, &'a Value)>,
    title: &str,
) -> Result<(), ValidationError> {
    let mut problems = Vec::new();
    for (column, value) in pairs {
        if value.is_null() {
            if !column.is_nullable() {
                problems.push(format!(
                    "Column '{}' does not accept NULL values.",
                    column.name()
                ));
            }
            continue;
        }
        if !column.ty().accepts(value) {
            problems.push(format!(
                "Column '{}' expects values of type '{}', but got value '{}' of type '{}'.",
                column.name(),
                column.ty().rust_type_name(),
                value,
                value.kind()
            ));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Type {
            title: title.to_string(),
            problems,
        })
    }
}

/// Conditions must target columns of `table` with values of the right type.
///
/// `IS NULL` and `IS NOT NULL` carry no value and are only checked for
/// ownership.
pub fn filter(table: &Table, filters: &[Filter]) -> Result<(), ValidationError> {
    columns_same_model(table, filters.iter().map(Filter::column), FILTER_TITLE)?;
    columns_values_are_same_type(
        filters
            .iter()
            .filter(|f| f.op().takes_value())
            .map(|f| (f.column(), f.value())),
        FILTER_TITLE,
    )
}

/// Ordering clauses must target columns of `table`.
pub fn ordering(table: &Table, orders: &[Order]) -> Result<(), ValidationError> {
    columns_same_model(table, orders.iter().map(Order::column), ORDER_TITLE)
}

/// Lists handed to add, update and select must not be empty.
pub fn non_empty(len: usize, what: &'static str) -> Result<(), ValidationError> {
    if len == 0 {
        Err(ValidationError::Empty { what })
    } else {
        Ok(())
    }
}

/// A limit must be a positive integer.
pub fn limit(limit: u64) -> Result<(), ValidationError> {
    if limit == 0 {
        Err(ValidationError::InvalidLimit)
    } else {
        Ok(())
    }
}
