//! Per-cycle outcome reporting

use std::fmt;

use crate::error::FailureKind;

/// What happened to one key during a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Published and the source object deleted
    Published {
        message_id: Option<String>,
        attempts: u32,
    },
    /// Published, but the delete failed. The object will be re-sent next cycle.
    PublishedNotDeleted { message_id: Option<String> },
    Malformed,
    SchemaInvalid,
    InvalidRecord,
    /// Publish attempts exhausted; the object stays in place
    PublishFailed,
    FetchFailed,
    /// Moved under the dead-letter prefix after a permanent failure
    DeadLettered { reason: FailureKind, to: String },
    /// Not started because shutdown was requested
    Cancelled,
}

impl KeyOutcome {
    pub(crate) fn from_failure(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Fetch => KeyOutcome::FetchFailed,
            FailureKind::Malformed => KeyOutcome::Malformed,
            FailureKind::SchemaInvalid => KeyOutcome::SchemaInvalid,
            FailureKind::InvalidRecord => KeyOutcome::InvalidRecord,
            FailureKind::PublishExhausted => KeyOutcome::PublishFailed,
        }
    }

    /// Delivered to the queue, whether or not the delete succeeded
    pub fn is_published(&self) -> bool {
        matches!(
            self,
            KeyOutcome::Published { .. } | KeyOutcome::PublishedNotDeleted { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            KeyOutcome::Malformed
                | KeyOutcome::SchemaInvalid
                | KeyOutcome::InvalidRecord
                | KeyOutcome::PublishFailed
                | KeyOutcome::FetchFailed
        )
    }
}

/// Outcome of every key seen by one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcomes: Vec<(String, KeyOutcome)>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn outcome(&self, key: &str) -> Option<&KeyOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| outcome)
    }

    pub fn published(&self) -> usize {
        self.count(KeyOutcome::is_published)
    }

    /// Published but left in the store
    pub fn undeleted(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::PublishedNotDeleted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(KeyOutcome::is_failure)
    }

    pub fn dead_lettered(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::DeadLettered { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, KeyOutcome::Cancelled))
    }

    fn count(&self, predicate: impl Fn(&KeyOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} failed, {} dead-lettered, {} cancelled",
            self.published(),
            self.failed(),
            self.dead_lettered(),
            self.cancelled()
        )
    }
}
