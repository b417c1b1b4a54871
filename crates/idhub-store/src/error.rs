//! Storage errors

use thiserror::Error;

/// Result alias for ledger operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the ledger store
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a statement or the connection failed
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The blocking task running a statement panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A row the operation depends on does not exist
    #[error("{0} not found.")]
    NotFound(&'static str),

    /// The database directory could not be prepared
    #[error("Failed to prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this is a missing-row error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
