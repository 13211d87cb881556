use thiserror::Error;

/// Errors surfaced by the connection handle, the query descriptor and the
/// configuration layer.
///
/// Driver failures are carried unmodified in [`Error::Sqlite`]; nothing in
/// this crate retries or rewrites them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown environment `{0}`")]
    UnknownEnvironment(String),

    #[error("client `{0}` is not supported, only sqlite3 connections can be opened")]
    UnsupportedClient(String),

    #[error("expected {expected} bindings, saw {found}")]
    BindingCount { expected: usize, found: usize },

    #[error("connection has been destroyed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
