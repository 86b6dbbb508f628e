//! Store errors.

use thiserror::Error;

/// Errors raised by a job store.
///
/// Both variants are recoverable caller-side conditions; the store never
/// retries internally and neither is fatal to the process.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A job with this id is already present.
    #[error("Job already exists: {0}")]
    JobAlreadyExists(String),

    /// No job with this id is present.
    #[error("Job does not exist: {0}")]
    JobDoesNotExist(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
