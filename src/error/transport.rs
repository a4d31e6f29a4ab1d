use super::IsRetryable;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Failure talking to the record store below the operation level:
/// opening a connection, pinging it, or closing it.
#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{stage} timed out after {after:?}")]
    TimedOut { stage: &'static str, after: Duration },

    #[error("invalid connection string: {0}")]
    InvalidTarget(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl IsRetryable for TransportError {
    fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidTarget(_))
    }
}
