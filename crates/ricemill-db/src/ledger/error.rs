//! Errors returned by [`Ledger`](super::Ledger) operations.

use thiserror::Error;

use crate::error::DbError;
use ricemill_core::{CoreError, ValidationError};

/// Outcome of a failed ledger call.
///
/// ```text
/// LedgerError
/// ├── Rule(CoreError)                 permanent: fix the input, the role or the sale state
/// └── StorageUnavailable(DbError)     SQLite failed; retry only if is_retryable()
/// ```
///
/// Either way the transaction was dropped and nothing was written.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Rule(#[from] CoreError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DbError),
}

impl LedgerError {
    /// True for transient storage failures (locked file, exhausted pool,
    /// lost connection). Rule violations never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Rule(_) => false,
            LedgerError::StorageUnavailable(e) => e.is_transient(),
        }
    }

    /// The rule violation, if this is one.
    pub fn rule(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Rule(e) => Some(e),
            LedgerError::StorageUnavailable(_) => None,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::StorageUnavailable(err.into())
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Rule(err.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(LedgerError::from(DbError::Busy("database is locked".into())).is_retryable());
        assert!(LedgerError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!LedgerError::from(DbError::QueryFailed("syntax".into())).is_retryable());
        assert!(!LedgerError::from(CoreError::EmptySale).is_retryable());
    }

    #[test]
    fn test_rule_message_passes_through() {
        let err = LedgerError::from(CoreError::EmptySale);
        assert_eq!(err.to_string(), "Sale has no lines");
        assert!(matches!(err.rule(), Some(CoreError::EmptySale)));
    }
}
