//! # Transport Errors

use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures of the underlying execution capability.
///
/// These are propagated unchanged by the status source. Only the readiness
/// gate retries them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Statement timed out after {0}ms")]
    Timeout(u64),
}

impl TransportError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(ms: u64) -> Self {
        Self::Timeout(ms)
    }
}
