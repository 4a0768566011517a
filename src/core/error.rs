use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    /// Any failure from the ledger database: connection, busy timeout, constraint or SQL.
    #[error("ledger database error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("i/o failure: {0}")]
    IoError(#[from] io::Error),
    #[error("cannot encode or decode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("snapshot rejected: {0}")]
    MalformedSnapshot(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("invalid value: {0}")]
    ValidationError(String),
    #[error("bad configuration: {0}")]
    ConfigError(String),
}

impl InventoryError {
    /// Store errors abort the whole operation; a caller may retry it as a unit.
    pub fn is_store_error(&self) -> bool {
        matches!(self, InventoryError::RusqliteError(_))
    }
}
