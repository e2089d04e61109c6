//! Error types for TxRelay records

use thiserror::Error;

/// Result type alias for record operations
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors raised while building or encoding a canonical record
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Invalid transaction data: {0}")]
    InvalidRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecordError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        RecordError::InvalidRecord(reason.into())
    }
}
