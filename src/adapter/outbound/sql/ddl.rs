//! Table creation and removal.

use super::dialect::Dialect;
use crate::domain::{Column, Table};
use crate::error::ValidationError;

/// `CREATE TABLE IF NOT EXISTS` for `table`.
///
/// A single autoincrement primary key is declared inline with the backend's
/// serial syntax; any other primary key becomes a table constraint.
pub fn create_table(dialect: Dialect, table: &Table) -> Result<String, ValidationError> {
    let primary_key: Vec<&Column> = table.primary_key().collect();
    let inline_serial = matches!(primary_key.as_slice(), [pk] if pk.is_autoincrement());

    let mut definitions = Vec::with_capacity(table.columns().len() + 1);
    for column in table.columns() {
        let name = dialect.quote("column", column.name())?;
        let definition = if inline_serial && column.is_primary_key() {
            format!("{name} {}", dialect.autoincrement_primary_key())
        } else if column.is_nullable() {
            format!("{name} {}", dialect.column_type(column.ty()))
        } else {
            format!("{name} {} NOT NULL", dialect.column_type(column.ty()))
        };
        definitions.push(definition);
    }

    if !inline_serial && !primary_key.is_empty() {
        let names = primary_key
            .iter()
            .map(|c| dialect.quote("column", c.name()))
            .collect::<Result<Vec<_>, _>>()?;
        definitions.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote("table", table.name())?,
        definitions.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS` for `table`.
pub fn drop_table(dialect: Dialect, table: &Table) -> Result<String, ValidationError> {
    Ok(format!(
        "DROP TABLE IF EXISTS {}",
        dialect.quote("table", table.name())?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColumnType;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                Column::new("users", "id", ColumnType::Integer)
                    .primary_key()
                    .autoincrement(),
                Column::new("users", "name", ColumnType::Text),
                Column::new("users", "seen_at", ColumnType::Timestamp).nullable(true),
            ],
        )
    }

    #[test]
    fn sqlite_serial_key_is_inline() {
        assert_eq!(
            create_table(Dialect::Sqlite, &users()).unwrap(),
            "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"name\" TEXT NOT NULL, \"seen_at\" TIMESTAMP)"
        );
    }

    #[test]
    fn mysql_uses_backend_types() {
        let sql = create_table(Dialect::MySql, &users()).unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `users` (`id` BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY"));
        assert!(sql.ends_with("`seen_at` DATETIME(6))"));
    }

    #[test]
    fn composite_key_becomes_constraint() {
        let table = Table::new(
            "memberships",
            vec![
                Column::new("memberships", "user_id", ColumnType::Integer).primary_key(),
                Column::new("memberships", "group_id", ColumnType::Integer).primary_key(),
            ],
        );
        assert_eq!(
            create_table(Dialect::Postgres, &table).unwrap(),
            "CREATE TABLE IF NOT EXISTS \"memberships\" (\"user_id\" BIGINT NOT NULL, \
             \"group_id\" BIGINT NOT NULL, PRIMARY KEY (\"user_id\", \"group_id\"))"
        );
    }

    #[test]
    fn drop_is_conditional() {
        assert_eq!(
            drop_table(Dialect::Sqlite, &users()).unwrap(),
            "DROP TABLE IF EXISTS \"users\""
        );
    }
}
