//! Database connection management using Diesel ORM.
//!
//! Provides one connection pool per backend and runs sessions on pooled
//! connections.

use std::fmt;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection, R2D2Connection};
use diesel::{Connection, SqliteConnection};
use tracing::debug;

use super::session::{RawConnection, Session};
use super::url::{Backend, DatabaseUrl};
use crate::adapter::outbound::sql::Dialect;
use crate::error::{Error, Result};

/// Default number of pooled connections for file and server databases.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Pragmas applied to every SQLite connection the pool opens.
const SQLITE_PRAGMAS: &str = "PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;";

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(SQLITE_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A Diesel r2d2 pool for one of the compiled-in backends.
#[derive(Clone)]
pub enum ConnectionPool {
    Sqlite(Pool<ConnectionManager<SqliteConnection>>),
    #[cfg(feature = "postgres")]
    Postgres(Pool<ConnectionManager<diesel::PgConnection>>),
    #[cfg(feature = "mysql")]
    MySql(Pool<ConnectionManager<diesel::MysqlConnection>>),
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionPool").field(&self.dialect()).finish()
    }
}

/// Create a connection pool for the given database URL.
///
/// In-memory SQLite databases live as long as their connection, so they get
/// a single connection that is never recycled.
///
/// # Errors
/// Returns an error if the backend is not compiled in or the pool cannot
/// open its first connection.
pub fn create_pool(url: &DatabaseUrl, max_size: u32) -> Result<ConnectionPool> {
    let max_size = max_size.max(1);
    debug!(url = %url, max_size, "Creating connection pool");
    match url.backend() {
        Backend::Sqlite => {
            let manager = ConnectionManager::<SqliteConnection>::new(url.connection_string());
            let builder = Pool::builder().connection_customizer(Box::new(SqlitePragmas));
            let builder = if url.is_memory() {
                builder.max_size(1).idle_timeout(None).max_lifetime(None)
            } else {
                builder.max_size(max_size)
            };
            builder
                .build(manager)
                .map(ConnectionPool::Sqlite)
                .map_err(|e| Error::Connection(e.to_string()))
        }
        #[cfg(feature = "postgres")]
        Backend::Postgres => {
            let manager = ConnectionManager::<diesel::PgConnection>::new(url.connection_string());
            Pool::builder()
                .max_size(max_size)
                .build(manager)
                .map(ConnectionPool::Postgres)
                .map_err(|e| Error::Connection(e.to_string()))
        }
        #[cfg(not(feature = "postgres"))]
        Backend::Postgres => Err(Error::UnsupportedBackend {
            backend: Backend::Postgres.name(),
            feature: "postgres",
        }),
        #[cfg(feature = "mysql")]
        Backend::MySql => {
            let manager = ConnectionManager::<diesel::MysqlConnection>::new(url.connection_string());
            Pool::builder()
                .max_size(max_size)
                .build(manager)
                .map(ConnectionPool::MySql)
                .map_err(|e| Error::Connection(e.to_string()))
        }
        #[cfg(not(feature = "mysql"))]
        Backend::MySql => Err(Error::UnsupportedBackend {
            backend: Backend::MySql.name(),
            feature: "mysql",
        }),
    }
}

fn checkout<C>(pool: &Pool<ConnectionManager<C>>) -> Result<PooledConnection<ConnectionManager<C>>>
where
    C: R2D2Connection + Send + 'static,
{
    pool.get().map_err(|e| Error::Connection(e.to_string()))
}

fn transact<C, T>(
    conn: &mut C,
    dialect: Dialect,
    f: impl FnOnce(&mut Session<'_>) -> Result<T>,
) -> Result<T>
where
    C: Connection + RawConnection,
{
    conn.transaction(|c| f(&mut Session::new(c, dialect)))
}

impl ConnectionPool {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Sqlite(_) => Dialect::Sqlite,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => Dialect::Postgres,
            #[cfg(feature = "mysql")]
            Self::MySql(_) => Dialect::MySql,
        }
    }

    /// Run `f` in a transaction on a pooled connection. The transaction
    /// commits when `f` returns `Ok` and rolls back otherwise.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<T>) -> Result<T> {
        let dialect = self.dialect();
        match self {
            Self::Sqlite(pool) => transact(&mut *checkout(pool)?, dialect, f),
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => transact(&mut *checkout(pool)?, dialect, f),
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => transact(&mut *checkout(pool)?, dialect, f),
        }
    }

    /// Run `f` on a pooled connection outside any transaction, for
    /// statements such as `VACUUM` that refuse to run inside one.
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Session<'_>) -> Result<T>) -> Result<T> {
        let dialect = self.dialect();
        match self {
            Self::Sqlite(pool) => {
                let mut pooled = checkout(pool)?;
                let conn: &mut SqliteConnection = &mut pooled;
                f(&mut Session::new(conn, dialect))
            }
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => {
                let mut pooled = checkout(pool)?;
                let conn: &mut diesel::PgConnection = &mut pooled;
                f(&mut Session::new(conn, dialect))
            }
            #[cfg(feature = "mysql")]
            Self::MySql(pool) => {
                let mut pooled = checkout(pool)?;
                let conn: &mut diesel::MysqlConnection = &mut pooled;
                f(&mut Session::new(conn, dialect))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sql::{Bind, Statement};

    fn memory_pool() -> ConnectionPool {
        create_pool(&DatabaseUrl::parse("sqlite://:memory:").unwrap(), DEFAULT_POOL_SIZE).unwrap()
    }

    fn count_notes(session: &mut Session<'_>) -> Result<i64> {
        session.count(&Statement {
            sql: "SELECT COUNT(*) AS count FROM notes".into(),
            binds: vec![],
        })
    }

    #[test]
    fn memory_database_survives_across_sessions() {
        let pool = memory_pool();
        pool.with_session(|s| s.batch_execute("CREATE TABLE notes (body TEXT)"))
            .unwrap();
        pool.with_session(|s| {
            s.execute(&Statement {
                sql: "INSERT INTO notes (body) VALUES (?)".into(),
                binds: vec![Bind::Text(Some("hello".into()))],
            })
        })
        .unwrap();
        assert_eq!(pool.with_session(count_notes).unwrap(), 1);
    }

    #[test]
    fn failing_session_rolls_back() {
        let pool = memory_pool();
        pool.with_session(|s| s.batch_execute("CREATE TABLE notes (body TEXT)"))
            .unwrap();
        let result: Result<()> = pool.with_session(|s| {
            s.batch_execute("INSERT INTO notes (body) VALUES ('lost')")?;
            Err(Error::Connection("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(pool.with_session(count_notes).unwrap(), 0);
    }

    #[test]
    fn connection_runs_outside_transaction() {
        let pool = memory_pool();
        assert!(pool.with_connection(|s| s.batch_execute("VACUUM")).is_ok());
    }

    #[test]
    fn file_pool_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let url = DatabaseUrl::parse(&format!("sqlite:///{}", path.display())).unwrap();
        let pool = create_pool(&url, 2).unwrap();
        pool.with_session(|s| s.batch_execute("CREATE TABLE notes (body TEXT)"))
            .unwrap();
        assert!(path.exists());
        assert_eq!(pool.with_session(count_notes).unwrap(), 0);
    }

    #[cfg(not(feature = "postgres"))]
    #[test]
    fn missing_backend_feature_is_reported() {
        let url = DatabaseUrl::parse("postgres://localhost/app").unwrap();
        let err = create_pool(&url, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PostgreSQL support is not compiled in (enable the `postgres` feature)"
        );
    }
}
