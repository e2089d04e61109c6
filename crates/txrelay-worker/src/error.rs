//! Pipeline error types

use thiserror::Error;
use txrelay_common::RecordError;

use crate::pipeline::validator::Diagnostic;

/// A record failed schema validation. Carries every violation found.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} schema violation(s): {}", .diagnostics.len(), join_diagnostics(.diagnostics))]
pub struct SchemaViolation {
    pub diagnostics: Vec<Diagnostic>,
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Publishing a record to the queue failed
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to encode message body: {0}")]
    Encode(#[from] RecordError),

    #[error("Publish failed after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Why a single object could not be relayed
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to fetch object: {0:#}")]
    Fetch(anyhow::Error),

    #[error("Object is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("Malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("Record rejected after validation: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Failure categories reported per key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Fetch failed; the object is retried next cycle
    Fetch,
    /// Bytes were not UTF-8 JSON
    Malformed,
    /// JSON did not match the transaction schema
    SchemaInvalid,
    /// Passed the schema but the transformer rejected it
    InvalidRecord,
    /// Every publish attempt failed; the object is retried next cycle
    PublishExhausted,
}

impl FailureKind {
    /// Permanent failures will fail again with the same bytes
    pub fn is_permanent(self) -> bool {
        matches!(
            self,
            FailureKind::Malformed | FailureKind::SchemaInvalid | FailureKind::InvalidRecord
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Malformed => "malformed",
            FailureKind::SchemaInvalid => "schema_invalid",
            FailureKind::InvalidRecord => "invalid_record",
            FailureKind::PublishExhausted => "publish_exhausted",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProcessError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProcessError::Fetch(_) => FailureKind::Fetch,
            ProcessError::Decode(_) | ProcessError::Malformed(_) => FailureKind::Malformed,
            ProcessError::Schema(_) => FailureKind::SchemaInvalid,
            // A record that cannot be encoded will fail the same way next cycle
            ProcessError::InvalidRecord(_) | ProcessError::Publish(PublishError::Encode(_)) => {
                FailureKind::InvalidRecord
            },
            ProcessError::Publish(PublishError::Exhausted { .. }) => FailureKind::PublishExhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_kinds() {
        assert!(FailureKind::Malformed.is_permanent());
        assert!(FailureKind::SchemaInvalid.is_permanent());
        assert!(FailureKind::InvalidRecord.is_permanent());
        assert!(!FailureKind::Fetch.is_permanent());
        assert!(!FailureKind::PublishExhausted.is_permanent());
    }

    #[test]
    fn test_malformed_json_maps_to_kind() {
        let err: ProcessError = serde_json::from_str::<serde_json::Value>("not-json")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), FailureKind::Malformed);
        assert!(err.to_string().starts_with("Malformed JSON"));
    }

    #[test]
    fn test_exhausted_message() {
        let err = PublishError::Exhausted {
            attempts: 3,
            last_error: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Publish failed after 3 attempt(s): connection refused"
        );
        assert_eq!(ProcessError::from(err).kind(), FailureKind::PublishExhausted);
    }

    #[test]
    fn test_encode_failure_is_not_exhaustion() {
        let err = ProcessError::from(PublishError::Encode(RecordError::invalid("bad amount")));
        assert_eq!(err.kind(), FailureKind::InvalidRecord);
        assert!(err.kind().is_permanent());
    }
}
