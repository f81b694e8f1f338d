//! Ledger Store Errors
//!
//! Error types for storage operations.

/// SQLSTATE codes that mean "another unit got there first"
const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A concurrent unit touched the same rows; the whole operation may be retried
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Persisted data violates a ledger invariant
    #[error("Corrupted ledger data: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    /// Check if this error is transient and the operation retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Conflict(_) => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            StoreError::Corrupted(_) => false,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) | Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}
