//! Administrative operations on a whole database.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::database::Database;
use crate::adapter::outbound::database::Backend;
use crate::domain::Registry;
use crate::error::{Error, Result};

/// Row count of one table, or why it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TableCount {
    Rows(i64),
    Failed(String),
}

impl TableCount {
    pub fn rows(&self) -> Option<i64> {
        match self {
            Self::Rows(n) => Some(*n),
            Self::Failed(_) => None,
        }
    }
}

/// Snapshot of the managed tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub database_url: String,
    pub tables: Vec<String>,
    pub table_counts: Vec<(String, TableCount)>,
}

impl DatabaseInfo {
    /// Sum of the counts that could be read.
    pub fn total_rows(&self) -> i64 {
        self.table_counts.iter().filter_map(|(_, c)| c.rows()).sum()
    }
}

/// Schema and file level management of the tables in a [`Registry`].
#[derive(Debug)]
pub struct DatabaseManager {
    database: Database,
}

impl DatabaseManager {
    /// Connect to `url`, creating any missing registered table.
    pub fn new(url: &str, registry: Registry) -> Result<Self> {
        Ok(Self::from_database(Database::connect(url, registry)?))
    }

    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn into_database(self) -> Database {
        self.database
    }

    /// Create all registered tables.
    pub fn create_database(&self) -> Result<()> {
        self.database.create_all()
    }

    /// Drop all registered tables.
    pub fn drop_database(&self) -> Result<()> {
        self.database.drop_all()
    }

    /// Drop and recreate all registered tables.
    pub fn reset_database(&self) -> Result<()> {
        info!("Resetting database");
        self.drop_database()?;
        self.create_database()
    }

    /// Registered tables and their row counts. A table whose count fails is
    /// reported with the error text instead of aborting the report.
    pub fn database_info(&self) -> DatabaseInfo {
        let registry = self.database.registry();
        let tables: Vec<String> = registry.table_names().into_iter().map(String::from).collect();
        let table_counts = registry
            .tables()
            .iter()
            .map(|table| {
                let count = match self.database.count(table, &[]) {
                    Ok(rows) => TableCount::Rows(rows),
                    Err(e) => {
                        warn!(table = table.name(), error = %e, "Failed to count rows");
                        TableCount::Failed(e.to_string())
                    }
                };
                (table.name().to_string(), count)
            })
            .collect();
        DatabaseInfo {
            database_url: self.database.url().redacted(),
            tables,
            table_counts,
        }
    }

    /// Copy the SQLite file to `path`, or to `<db>.backup` when no path is
    /// given. Returns where the backup was written.
    pub fn backup_database(&self, path: Option<&Path>) -> Result<PathBuf> {
        let db_path = self.sqlite_file("Backup")?;
        let backup = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let mut name = db_path.as_os_str().to_os_string();
                name.push(".backup");
                PathBuf::from(name)
            }
        };
        ensure_distinct("Backup", &db_path, &backup)?;
        fs::copy(&db_path, &backup)?;
        info!(from = %db_path.display(), to = %backup.display(), "Database backed up");
        Ok(backup)
    }

    /// Overwrite the SQLite file with `path` and reopen the pool.
    pub fn restore_database(&mut self, path: &Path) -> Result<()> {
        let db_path = self.sqlite_file("Restore")?;
        if !path.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("backup file not found: {}", path.display()),
            )));
        }
        ensure_distinct("Restore", path, &db_path)?;
        fs::copy(path, &db_path)?;
        self.database.reconnect()?;
        info!(from = %path.display(), "Database restored");
        Ok(())
    }

    /// Rebuild the SQLite file to reclaim free pages.
    pub fn vacuum_database(&self) -> Result<()> {
        self.require_sqlite("Vacuum")?;
        self.database
            .with_connection(|session| session.batch_execute("VACUUM"))?;
        info!("Database vacuumed");
        Ok(())
    }

    fn require_sqlite(&self, operation: &'static str) -> Result<()> {
        if self.database.url().backend() == Backend::Sqlite {
            Ok(())
        } else {
            Err(Error::SqliteOnly { operation })
        }
    }

    fn sqlite_file(&self, operation: &'static str) -> Result<PathBuf> {
        self.require_sqlite(operation)?;
        self.database
            .url()
            .sqlite_path()
            .map(Path::to_path_buf)
            .ok_or(Error::InMemory { operation })
    }
}

/// `fs::copy` truncates its destination first, so copying a file onto
/// itself would empty it.
fn ensure_distinct(operation: &'static str, source: &Path, destination: &Path) -> Result<()> {
    if let (Ok(source), Ok(destination)) = (fs::canonicalize(source), fs::canonicalize(destination)) {
        if source == destination {
            return Err(Error::SameFile {
                operation,
                path: source,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::standard_model! {
        #[derive(Debug, Clone)]
        struct Item in "items" {
            name: String,
        }
    }

    fn manager(url: &str) -> DatabaseManager {
        let mut registry = Registry::new();
        registry.register::<Item>().unwrap();
        DatabaseManager::new(url, registry).unwrap()
    }

    #[test]
    fn info_counts_rows_per_table() {
        let manager = manager("sqlite://:memory:");
        manager
            .database()
            .add(&[Item::new("a".into()), Item::new("b".into())])
            .unwrap();
        let info = manager.database_info();
        assert_eq!(info.database_url, "sqlite://:memory:");
        assert_eq!(info.tables, ["items"]);
        assert_eq!(info.table_counts, [("items".to_string(), TableCount::Rows(2))]);
        assert_eq!(info.total_rows(), 2);
    }

    #[test]
    fn info_records_count_failures() {
        let manager = manager("sqlite://:memory:");
        manager.drop_database().unwrap();
        let info = manager.database_info();
        assert!(matches!(info.table_counts[0].1, TableCount::Failed(_)));
        assert_eq!(info.total_rows(), 0);
    }

    #[test]
    fn reset_empties_tables() {
        let manager = manager("sqlite://:memory:");
        manager.database().add(&[Item::new("a".into())]).unwrap();
        manager.reset_database().unwrap();
        assert_eq!(manager.database_info().total_rows(), 0);
    }

    #[test]
    fn file_operations_need_a_file() {
        let mut manager = manager("sqlite://:memory:");
        let err = manager.backup_database(None).unwrap_err();
        assert_eq!(err.to_string(), "Backup requires a file-backed SQLite database");
        assert!(manager.restore_database(Path::new("x.db")).is_err());
        assert!(manager.vacuum_database().is_ok());
    }

    #[test]
    fn table_counts_serialize_untagged() {
        let json = serde_json::to_value([TableCount::Rows(3), TableCount::Failed("gone".into())]).unwrap();
        assert_eq!(json, serde_json::json!([3, "gone"]));
    }
}
