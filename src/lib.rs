//! Raw parameterized SQL against a single SQLite database.
//!
//! # Intention
//!
//! - Show how application code submits literal and parameterized SQL
//!   through one connection handle and reads back row sets.
//! - Keep all driver behavior (parsing, binding, errors) in rusqlite.
//!
//! # Architectural Boundaries
//!
//! - No pooling, retries, caching or transactions.
//! - Query functions bind values; they never concatenate them into SQL.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod queries;
pub mod query;
pub mod sqlite;

pub use config::{ClientKind, ConnectionConfig, DatabaseConfig};
pub use error::{Error, Result};
pub use query::{Params, SqlQuery, Value};
pub use sqlite::{Database, Executor, Row};
