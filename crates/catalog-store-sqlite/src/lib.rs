//! SQLite backend for the catalog hierarchy engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Writes go through `IMMEDIATE`
//! transactions, which serialises every insert-or-fetch on the one
//! connection.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
