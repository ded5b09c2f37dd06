//! Unit of work over one pooled connection.

use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Bool, Double, Nullable, Text, Timestamp};
use diesel::{QueryResult, QueryableByName, RunQueryDsl};
use tracing::debug;

use crate::adapter::outbound::sql::{decode_row, Bind, Dialect, Statement};
use crate::domain::{Column, Record};
use crate::error::Result;

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Text)]
    json_row: String,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Backend-erased access to a Diesel connection.
///
/// Implemented for every compiled-in connection type so a [`Session`] can
/// run rendered statements without knowing the backend.
pub trait RawConnection {
    fn execute_statement(&mut self, statement: &Statement) -> QueryResult<usize>;

    /// Rows of a statement projecting one JSON text column.
    fn load_json_rows(&mut self, statement: &Statement) -> QueryResult<Vec<String>>;

    fn load_count(&mut self, statement: &Statement) -> QueryResult<i64>;

    fn batch_execute_sql(&mut self, sql: &str) -> QueryResult<()>;
}

macro_rules! raw_connection {
    ($conn:ty, $backend:ty) => {
        impl RawConnection for $conn {
            fn execute_statement(&mut self, statement: &Statement) -> QueryResult<usize> {
                prepare::<$backend>(statement).execute(self)
            }

            fn load_json_rows(&mut self, statement: &Statement) -> QueryResult<Vec<String>> {
                let rows: Vec<JsonRow> = prepare::<$backend>(statement).load(self)?;
                Ok(rows.into_iter().map(|row| row.json_row).collect())
            }

            fn load_count(&mut self, statement: &Statement) -> QueryResult<i64> {
                let row: CountRow = prepare::<$backend>(statement).get_result(self)?;
                Ok(row.count)
            }

            fn batch_execute_sql(&mut self, sql: &str) -> QueryResult<()> {
                diesel::connection::SimpleConnection::batch_execute(self, sql)
            }
        }
    };
}

/// Box `statement` into a raw query with its binds applied in order.
fn prepare<DB>(statement: &Statement) -> BoxedSqlQuery<'static, DB, SqlQuery>
where
    DB: diesel::backend::Backend
        + diesel::sql_types::HasSqlType<BigInt>
        + diesel::sql_types::HasSqlType<Double>
        + diesel::sql_types::HasSqlType<Text>
        + diesel::sql_types::HasSqlType<Bool>
        + diesel::sql_types::HasSqlType<Timestamp>,
    Option<i64>: diesel::serialize::ToSql<Nullable<BigInt>, DB>,
    Option<f64>: diesel::serialize::ToSql<Nullable<Double>, DB>,
    Option<String>: diesel::serialize::ToSql<Nullable<Text>, DB>,
    Option<bool>: diesel::serialize::ToSql<Nullable<Bool>, DB>,
    Option<chrono::NaiveDateTime>: diesel::serialize::ToSql<Nullable<Timestamp>, DB>,
{
    let mut query = diesel::sql_query(statement.sql.clone()).into_boxed::<DB>();
    for bind in &statement.binds {
        query = match bind.clone() {
            Bind::Integer(v) => query.bind::<Nullable<BigInt>, _>(v),
            Bind::Float(v) => query.bind::<Nullable<Double>, _>(v),
            Bind::Text(v) => query.bind::<Nullable<Text>, _>(v),
            Bind::Boolean(v) => query.bind::<Nullable<Bool>, _>(v),
            Bind::Timestamp(v) => query.bind::<Nullable<Timestamp>, _>(v),
        };
    }
    query
}

raw_connection!(diesel::SqliteConnection, diesel::sqlite::Sqlite);

#[cfg(feature = "postgres")]
raw_connection!(diesel::PgConnection, diesel::pg::Pg);

#[cfg(feature = "mysql")]
raw_connection!(diesel::MysqlConnection, diesel::mysql::Mysql);

/// A connection checked out for one unit of work.
///
/// Sessions handed out by [`Database::with_session`](crate::Database::with_session)
/// run inside a transaction that commits when the closure returns `Ok`.
pub struct Session<'c> {
    conn: &'c mut dyn RawConnection,
    dialect: Dialect,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c mut dyn RawConnection, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Run a statement, returning the number of affected rows.
    pub fn execute(&mut self, statement: &Statement) -> Result<usize> {
        debug!(sql = %statement.sql, binds = statement.binds.len(), "Executing statement");
        Ok(self.conn.execute_statement(statement)?)
    }

    /// Run a row query and decode each row into a record of `columns`.
    pub fn load_records(&mut self, statement: &Statement, columns: &[&Column]) -> Result<Vec<Record>> {
        debug!(sql = %statement.sql, binds = statement.binds.len(), "Loading rows");
        self.conn
            .load_json_rows(statement)?
            .iter()
            .map(|json| decode_row(columns, json))
            .collect()
    }

    /// Run a count query.
    pub fn count(&mut self, statement: &Statement) -> Result<i64> {
        debug!(sql = %statement.sql, binds = statement.binds.len(), "Counting rows");
        Ok(self.conn.load_count(statement)?)
    }

    /// Run raw SQL without binds, e.g. DDL or `VACUUM`.
    pub fn batch_execute(&mut self, sql: &str) -> Result<()> {
        debug!(sql, "Executing batch");
        Ok(self.conn.batch_execute_sql(sql)?)
    }
}
