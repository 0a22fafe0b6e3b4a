//! SQLite backend for the Aditus gate.
//!
//! Implements the Access Ledger and all registry traits over one database
//! file, wrapping [`tokio_rusqlite`] so database access runs on a dedicated
//! thread without blocking the async runtime. The ledger's one-admission
//! invariant lives in the schema (a partial UNIQUE index), so it holds
//! across independent gate processes sharing the file.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{AuditEntry, NewExam, NewStudent, SqliteStore};
