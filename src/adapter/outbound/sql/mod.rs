//! SQL text rendering for the supported backends.

mod ddl;
mod dialect;
mod row;
mod statement;

pub use ddl::{create_table, drop_table};
pub use dialect::{validate_identifier, Dialect};
pub use row::decode_row;
pub use statement::{count, delete, insert, select_rows, update, Bind, Statement, COUNT, JSON_ROW};
