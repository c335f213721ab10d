//! Store error types

use thiserror::Error;

/// Errors surfaced by index store backends and the match engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing state could not be opened or initialized.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A single read or write failed; the caller may retry.
    #[error("store operation failed: {0}")]
    Transient(String),
    /// A stored row decoded into something the contract forbids.
    #[error("invalid stored value: {0}")]
    InvalidRow(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Transient(e.to_string())
    }
}
