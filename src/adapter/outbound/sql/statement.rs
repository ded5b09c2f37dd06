//! Parameterized DML statements.
//!
//! Statements are rendered as SQL text plus typed binds. Values never reach
//! the SQL text; identifiers are validated and quoted by the [`Dialect`].

use chrono::NaiveDateTime;

use super::dialect::{Dialect, JSON_OBJECT_MAX_PAIRS};
use crate::domain::{Column, ColumnType, Filter, Order, Record, SqlValue, Table, Value};
use crate::error::ValidationError;

/// Alias of the projected JSON column in row queries.
pub const JSON_ROW: &str = "json_row";

/// Alias of the count column in count queries.
pub const COUNT: &str = "count";

/// A bound value, typed by the column it targets so `NULL`s bind with the
/// right SQL type.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Integer(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Boolean(Option<bool>),
    Timestamp(Option<NaiveDateTime>),
}

impl Bind {
    /// Convert `value` to a bind for a column of `column`'s type.
    pub fn for_column(column: &Column, value: &Value) -> Result<Self, ValidationError> {
        let converted = match column.ty() {
            ColumnType::Integer => Option::<i64>::from_value(value.clone()).map(Self::Integer),
            ColumnType::Float => Option::<f64>::from_value(value.clone()).map(Self::Float),
            ColumnType::Text => Option::<String>::from_value(value.clone()).map(Self::Text),
            ColumnType::Boolean => Option::<bool>::from_value(value.clone()).map(Self::Boolean),
            ColumnType::Timestamp => {
                Option::<NaiveDateTime>::from_value(value.clone()).map(Self::Timestamp)
            }
        };
        converted.map_err(|e| ValidationError::Type {
            title: String::new(),
            problems: vec![format!("Column '{}' cannot bind value: {e}", column.name())],
        })
    }

    pub const fn ty(&self) -> ColumnType {
        match self {
            Self::Integer(_) => ColumnType::Integer,
            Self::Float(_) => ColumnType::Float,
            Self::Text(_) => ColumnType::Text,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Timestamp(_) => ColumnType::Timestamp,
        }
    }
}

/// SQL text with its binds, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

/// Accumulates SQL text and numbers placeholders as binds are pushed.
struct SqlWriter {
    dialect: Dialect,
    sql: String,
    binds: Vec<Bind>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn table(&mut self, table: &Table) -> Result<(), ValidationError> {
        let quoted = self.dialect.quote("table", table.name())?;
        self.push(&quoted);
        Ok(())
    }

    fn column(&mut self, column: &Column) -> Result<(), ValidationError> {
        let quoted = self.dialect.quote("column", column.name())?;
        self.push(&quoted);
        Ok(())
    }

    fn bind(&mut self, column: &Column, value: &Value) -> Result<(), ValidationError> {
        self.binds.push(Bind::for_column(column, value)?);
        let placeholder = self.dialect.placeholder(self.binds.len());
        self.push(&placeholder);
        Ok(())
    }

    fn where_clause(&mut self, filters: &[Filter]) -> Result<(), ValidationError> {
        for (i, filter) in filters.iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            self.column(filter.column())?;
            self.push(" ");
            self.push(filter.op().sql());
            if filter.op().takes_value() {
                self.push(" ");
                self.bind(filter.column(), filter.value())?;
            }
        }
        Ok(())
    }

    fn order_clause(&mut self, orders: &[Order]) -> Result<(), ValidationError> {
        for (i, order) in orders.iter().enumerate() {
            self.push(if i == 0 { " ORDER BY " } else { ", " });
            self.column(order.column())?;
            self.push(" ");
            self.push(order.direction().sql());
        }
        Ok(())
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            binds: self.binds,
        }
    }
}

/// `SELECT` projecting `columns` of each matching row as one JSON object.
pub fn select_rows(
    dialect: Dialect,
    table: &Table,
    columns: &[&Column],
    filters: &[Filter],
    orders: &[Order],
    limit: Option<u64>,
) -> Result<Statement, ValidationError> {
    let mut pairs = Vec::with_capacity(columns.len());
    for column in columns {
        let quoted = dialect.quote("column", column.name())?;
        pairs.push(format!(
            "'{}', {}",
            column.name(),
            dialect.json_value(column.ty(), &quoted)
        ));
    }
    let groups: Vec<String> = pairs
        .chunks(JSON_OBJECT_MAX_PAIRS)
        .map(|group| group.join(", "))
        .collect();

    let mut w = SqlWriter::new(dialect);
    w.push("SELECT ");
    w.push(&dialect.json_object(&groups));
    w.push(&format!(" AS {JSON_ROW} FROM "));
    w.table(table)?;
    w.where_clause(filters)?;
    w.order_clause(orders)?;
    if let Some(limit) = limit {
        w.push(&format!(" LIMIT {limit}"));
    }
    Ok(w.finish())
}

/// `SELECT COUNT(*)` over the rows matching `filters`.
pub fn count(dialect: Dialect, table: &Table, filters: &[Filter]) -> Result<Statement, ValidationError> {
    let mut w = SqlWriter::new(dialect);
    w.push(&format!("SELECT COUNT(*) AS {COUNT} FROM "));
    w.table(table)?;
    w.where_clause(filters)?;
    Ok(w.finish())
}

/// `INSERT` of one row. Columns of `table` absent from `record` are left to
/// the database.
pub fn insert(dialect: Dialect, table: &Table, record: &Record) -> Result<Statement, ValidationError> {
    let assigned: Vec<(&Column, &Value)> = table
        .columns()
        .iter()
        .filter_map(|c| record.get(c.name()).map(|v| (c, v)))
        .collect();

    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO ");
    w.table(table)?;
    if assigned.is_empty() {
        w.push(" ");
        w.push(dialect.default_values());
        return Ok(w.finish());
    }

    w.push(" (");
    for (i, (column, _)) in assigned.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.column(column)?;
    }
    w.push(") VALUES (");
    for (i, (column, value)) in assigned.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.bind(column, value)?;
    }
    w.push(")");
    Ok(w.finish())
}

/// `UPDATE` setting each assignment on the rows matching `filters`.
pub fn update(
    dialect: Dialect,
    table: &Table,
    assignments: &[(Column, Value)],
    filters: &[Filter],
) -> Result<Statement, ValidationError> {
    let mut w = SqlWriter::new(dialect);
    w.push("UPDATE ");
    w.table(table)?;
    for (i, (column, value)) in assignments.iter().enumerate() {
        w.push(if i == 0 { " SET " } else { ", " });
        w.column(column)?;
        w.push(" = ");
        w.bind(column, value)?;
    }
    w.where_clause(filters)?;
    Ok(w.finish())
}

/// `DELETE` of the rows matching `filters`.
pub fn delete(dialect: Dialect, table: &Table, filters: &[Filter]) -> Result<Statement, ValidationError> {
    let mut w = SqlWriter::new(dialect);
    w.push("DELETE FROM ");
    w.table(table)?;
    w.where_clause(filters)?;
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                Column::new("users", "id", ColumnType::Integer)
                    .primary_key()
                    .autoincrement(),
                Column::new("users", "name", ColumnType::Text),
                Column::new("users", "score", ColumnType::Float).nullable(true),
            ],
        )
    }

    fn col(table: &Table, name: &str) -> Column {
        table.column(name).unwrap().clone()
    }

    #[test]
    fn select_projects_json_with_clauses() {
        let table = users();
        let columns: Vec<&Column> = table.columns().iter().collect();
        let stmt = select_rows(
            Dialect::Sqlite,
            &table,
            &columns,
            &[col(&table, "name").eq("Ada"), col(&table, "score").is_not_null()],
            &[col(&table, "id").desc()],
            Some(5),
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT json_object('id', \"id\", 'name', \"name\", 'score', \
             CASE WHEN \"score\" IS NULL THEN NULL ELSE printf('%!.17g', \"score\") END) AS json_row \
             FROM \"users\" WHERE \"name\" = ? AND \"score\" IS NOT NULL ORDER BY \"id\" DESC LIMIT 5"
        );
        assert_eq!(stmt.binds, vec![Bind::Text(Some("Ada".into()))]);
    }

    #[test]
    fn wide_selects_split_json_objects() {
        let columns: Vec<Column> = (0..120)
            .map(|i| Column::new("wide", format!("c{i}"), ColumnType::Integer))
            .collect();
        let table = Table::new("wide", columns);
        let refs: Vec<&Column> = table.columns().iter().collect();
        let stmt = select_rows(Dialect::Sqlite, &table, &refs, &[], &[], None).unwrap();
        assert_eq!(stmt.sql.matches("json_object(").count(), 3);
        assert_eq!(stmt.sql.matches("json_patch(").count(), 2);
        assert!(stmt.sql.contains("'c119', \"c119\""));
    }

    #[test]
    fn postgres_numbers_placeholders() {
        let table = users();
        let stmt = update(
            Dialect::Postgres,
            &table,
            &[col(&table, "name").set("Bob"), col(&table, "score").set(Value::Null)],
            &[col(&table, "id").eq(1)],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"users\" SET \"name\" = $1, \"score\" = $2 WHERE \"id\" = $3"
        );
        assert_eq!(
            stmt.binds,
            vec![
                Bind::Text(Some("Bob".into())),
                Bind::Float(None),
                Bind::Integer(Some(1)),
            ]
        );
    }

    #[test]
    fn insert_skips_absent_columns() {
        let table = users();
        let record = Record::new().with("score", 3i64).with("name", "Ada");
        let stmt = insert(Dialect::MySql, &table, &record).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO `users` (`name`, `score`) VALUES (?, ?)");
        assert_eq!(
            stmt.binds,
            vec![Bind::Text(Some("Ada".into())), Bind::Float(Some(3.0))]
        );
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let stmt = insert(Dialect::Sqlite, &users(), &Record::new()).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO \"users\" DEFAULT VALUES");
        assert!(stmt.binds.is_empty());
    }

    #[test]
    fn count_and_delete_without_filters() {
        let table = users();
        assert_eq!(
            count(Dialect::Sqlite, &table, &[]).unwrap().sql,
            "SELECT COUNT(*) AS count FROM \"users\""
        );
        assert_eq!(
            delete(Dialect::Sqlite, &table, &[col(&table, "name").like("A%")])
                .unwrap()
                .sql,
            "DELETE FROM \"users\" WHERE \"name\" LIKE ?"
        );
    }

    #[test]
    fn unsafe_table_name_is_rejected() {
        let table = Table::new("users; --", vec![]);
        let err = count(Dialect::Sqlite, &table, &[]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { kind: "table", .. }));
    }

    #[test]
    fn bind_rejects_mismatched_value() {
        let column = Column::new("users", "name", ColumnType::Text);
        assert!(Bind::for_column(&column, &Value::Integer(1)).is_err());
        assert_eq!(
            Bind::for_column(&column, &Value::Null).unwrap().ty(),
            ColumnType::Text
        );
    }
}
