//! Declarative base: tables, columns, values and models.

mod column;
mod expr;
mod record;
mod table;
mod value;

pub mod model;

pub use column::{Column, ValueFn};
pub use expr::{Direction, Filter, Op, Order};
pub use model::{utc_now, Model};
pub use record::Record;
pub use table::{Registry, Table};
pub use value::{ColumnType, SqlValue, Value, ValueError, TIMESTAMP_FORMAT};
