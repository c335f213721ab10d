//! Service error types

use crate::pool::PoolStopped;
use thiserror::Error;
use waveprint_store::StoreError;

/// Request-level failures surfaced in `MatchResponse::error_message`.
///
/// No failure escapes a worker: each kind is translated into a failed
/// response and counted under `match_errors`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed and never reached the engine.
    #[error("invalid request: {0}")]
    InvalidInput(String),
    /// The store or engine failed while serving the request.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Submitted after the worker pool shut down.
    #[error("worker pool is stopped")]
    PoolStopped,
    /// Anything unclassified.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PoolStopped> for ServiceError {
    fn from(_: PoolStopped) -> Self {
        ServiceError::PoolStopped
    }
}
