//! Outbound adapters (driven side).

pub mod database;
pub mod sql;
