//! Application services.
//!
//! The validator guards every operation, the facade runs CRUD over
//! registered models, and the manager handles whole-database chores.

pub mod database;
pub mod manager;
pub mod validate;

pub use database::{results_to_dictionaries, Database, GetOptions, Query, Selection};
pub use manager::{DatabaseInfo, DatabaseManager, TableCount};
