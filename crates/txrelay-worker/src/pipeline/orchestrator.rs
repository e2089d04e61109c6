//! Poll cycle orchestrator
//!
//! One cycle lists the bucket and drives every key through
//! fetch, parse, validate, transform, publish, delete. A failing key never
//! stops the cycle; only a failed listing does.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::publisher::{Delivery, Publisher};
use super::record::RawObject;
use super::report::{CycleReport, KeyOutcome};
use super::{transformer, validator};
use crate::config::PipelineConfig;
use crate::error::{ProcessError, PublishError};
use crate::queue::MessageQueue;
use crate::storage::ObjectStore;

pub struct PollCycle {
    store: Arc<dyn ObjectStore>,
    publisher: Publisher,
    dead_letter_prefix: Option<String>,
    concurrency: usize,
}

impl PollCycle {
    /// Sequential cycle without dead-lettering
    pub fn new(store: Arc<dyn ObjectStore>, publisher: Publisher) -> Self {
        Self {
            store,
            publisher,
            dead_letter_prefix: None,
            concurrency: 1,
        }
    }

    pub fn from_config(
        config: &PipelineConfig,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        let publisher = Publisher::new(queue, config.max_publish_attempts)
            .with_retry_delay(config.publish_retry_delay());

        let cycle = Self::new(store, publisher).with_concurrency(config.max_concurrent_objects);
        match &config.dead_letter_prefix {
            Some(prefix) => cycle.with_dead_letter_prefix(prefix.clone()),
            None => cycle,
        }
    }

    /// Relocate permanently failing objects under `prefix`. An empty prefix
    /// disables relocation.
    pub fn with_dead_letter_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.dead_letter_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Maximum keys in flight at once; values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Run one cycle over everything currently in the store.
    ///
    /// Keys not yet started when `cancel` fires are reported as
    /// [`KeyOutcome::Cancelled`] and left untouched.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        info!(bucket = %self.bucket(), "Starting poll cycle");

        let mut keys = self
            .store
            .list()
            .await
            .with_context(|| format!("Failed to list objects in bucket {}", self.bucket()))?;

        if let Some(prefix) = &self.dead_letter_prefix {
            keys.retain(|key| !key.starts_with(prefix.as_str()));
        }

        if keys.is_empty() {
            info!(bucket = %self.bucket(), "No new files found in bucket");
            return Ok(CycleReport::default());
        }

        debug!(count = keys.len(), "Objects to process");

        // `buffered` keeps outcomes in listing order
        let outcomes = stream::iter(keys)
            .map(|key| self.process_key(key, cancel))
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let report = CycleReport { outcomes };
        info!(
            published = report.published(),
            undeleted = report.undeleted(),
            failed = report.failed(),
            dead_lettered = report.dead_lettered(),
            cancelled = report.cancelled(),
            "Poll cycle completed"
        );

        Ok(report)
    }

    #[instrument(skip(self, cancel))]
    async fn process_key(&self, key: String, cancel: &CancellationToken) -> (String, KeyOutcome) {
        if cancel.is_cancelled() {
            debug!("Shutdown requested, skipping object");
            return (key, KeyOutcome::Cancelled);
        }

        info!("Processing object");

        let outcome = match self.try_process(&key).await {
            Ok(delivery) => self.finish(&key, delivery).await,
            Err(e) => self.handle_failure(&key, e).await,
        };

        (key, outcome)
    }

    async fn try_process(&self, key: &str) -> Result<Delivery, ProcessError> {
        let body = self.store.fetch(key).await.map_err(ProcessError::Fetch)?;

        let parsed = RawObject::new(key, body).parse()?;
        let validated = validator::validate(parsed)?;
        let record = transformer::transform(&validated)?;

        Ok(self.publisher.publish(&record).await?)
    }

    /// Delete the source object after a confirmed publish
    async fn finish(&self, key: &str, delivery: Delivery) -> KeyOutcome {
        match self.store.delete(key).await {
            Ok(()) => {
                info!(message_id = ?delivery.message_id, "File processed and deleted");
                KeyOutcome::Published {
                    message_id: delivery.message_id,
                    attempts: delivery.attempts,
                }
            },
            Err(e) => {
                warn!(
                    message_id = ?delivery.message_id,
                    error = %format!("{:#}", e),
                    "Published but failed to delete object; it will be sent again next cycle"
                );
                KeyOutcome::PublishedNotDeleted {
                    message_id: delivery.message_id,
                }
            },
        }
    }

    async fn handle_failure(&self, key: &str, err: ProcessError) -> KeyOutcome {
        match &err {
            ProcessError::Fetch(e) => {
                error!(error = %format!("{:#}", e), "Failed to fetch object")
            },
            ProcessError::Decode(_) | ProcessError::Malformed(_) => {
                error!(error = %err, "Malformed JSON")
            },
            ProcessError::Schema(violation) => {
                warn!(errors = %violation, "JSON validation failed")
            },
            ProcessError::InvalidRecord(e) => {
                error!(error = %e, "Invalid transaction data after validation")
            },
            ProcessError::Publish(PublishError::Encode(e)) => {
                error!(error = %e, "Failed to encode message body")
            },
            // Publisher has already logged the exhaustion
            ProcessError::Publish(PublishError::Exhausted { .. }) => {},
        }

        let kind = err.kind();
        let Some(prefix) = self.dead_letter_prefix.as_deref().filter(|_| kind.is_permanent())
        else {
            return KeyOutcome::from_failure(kind);
        };

        let target = format!("{}{}", prefix, key);
        match self.store.relocate(key, &target).await {
            Ok(()) => {
                warn!(reason = %kind, to = %target, "Moved object to dead-letter prefix");
                KeyOutcome::DeadLettered {
                    reason: kind,
                    to: target,
                }
            },
            Err(e) => {
                error!(
                    reason = %kind,
                    to = %target,
                    error = %format!("{:#}", e),
                    "Failed to move object to dead-letter prefix"
                );
                KeyOutcome::from_failure(kind)
            },
        }
    }
}
