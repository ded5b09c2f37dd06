//! Diesel-backed connections and sessions.

pub mod connection;
pub mod session;
pub mod url;

pub use connection::{create_pool, ConnectionPool, DEFAULT_POOL_SIZE};
pub use session::{RawConnection, Session};
pub use url::{Backend, DatabaseUrl};
