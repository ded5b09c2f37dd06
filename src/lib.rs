//! Ormkit - validated CRUD over Diesel plus a database management CLI.
//!
//! Every read and write goes through a validator that checks columns belong
//! to registered models and values match column types before any SQL is
//! issued. Models share a standard mixin: an autoincrement `id` and
//! `created_at`/`updated_at` timestamps kept in UTC.
//!
//! # Modules
//!
//! - [`domain`] - Columns, tables, values, records and the [`Model`] trait
//! - [`application`] - The [`Database`] facade, [`DatabaseManager`] and validator
//! - [`adapter`] - SQL rendering, Diesel connection pools and the CLI
//! - [`infrastructure`] - TOML configuration and logging setup
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `postgres` - PostgreSQL backend through Diesel's `PgConnection`
//! - `mysql` - MySQL backend through Diesel's `MysqlConnection`
//!
//! # Example
//!
//! ```
//! use ormkit::{standard_model, Database, GetOptions, Registry};
//!
//! standard_model! {
//!     #[derive(Debug, Clone)]
//!     pub struct User in "users" {
//!         pub name: String,
//!         pub age: Option<i64>,
//!     }
//! }
//!
//! # fn main() -> ormkit::Result<()> {
//! let mut registry = Registry::new();
//! registry.register::<User>()?;
//! let db = Database::connect("sqlite://:memory:", registry)?;
//!
//! db.add(&[User::new("Ada".into(), Some(36))])?;
//! let adults = db.get::<User>(GetOptions::new().filter([User::age().ge(18_i64)]))?;
//! assert_eq!(adults.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use adapter::inbound::cli;
pub use adapter::outbound::database::{Backend, DatabaseUrl, Session};
pub use application::{
    results_to_dictionaries, Database, DatabaseInfo, DatabaseManager, GetOptions, Query,
    Selection, TableCount,
};
pub use chrono::NaiveDateTime;
pub use domain::{
    utc_now, Column, ColumnType, Direction, Filter, Model, Op, Order, Record, Registry, SqlValue,
    Table, Value,
};
pub use error::{ConfigError, Error, Result, ValidationError};
