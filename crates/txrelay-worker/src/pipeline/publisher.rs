//! Queue publisher with bounded retry

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use txrelay_common::CanonicalRecord;

use crate::error::PublishError;
use crate::queue::MessageQueue;

/// A confirmed delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: Option<String>,
    /// Sends made, including the successful one
    pub attempts: u32,
}

#[derive(Clone)]
pub struct Publisher {
    queue: Arc<dyn MessageQueue>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Publisher {
    /// `max_attempts` counts the first send; values below 1 are raised to 1.
    pub fn new(queue: Arc<dyn MessageQueue>, max_attempts: u32) -> Self {
        Self {
            queue,
            max_attempts: max_attempts.max(1),
            retry_delay: Duration::ZERO,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Send `record`, re-sending the identical body until the queue accepts it
    /// or the attempt budget runs out.
    pub async fn publish(&self, record: &CanonicalRecord) -> Result<Delivery, PublishError> {
        let body = record.to_message_body()?;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.queue.send(&body).await {
                Ok(message_id) => {
                    info!(
                        id = %record.id(),
                        message_id = ?message_id,
                        attempt,
                        "Message published to queue"
                    );
                    return Ok(Delivery {
                        message_id,
                        attempts: attempt,
                    });
                },
                Err(e) => {
                    last_error = format!("{:#}", e);

                    if attempt < self.max_attempts {
                        warn!(
                            id = %record.id(),
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %last_error,
                            "Retrying queue publish"
                        );
                        if !self.retry_delay.is_zero() {
                            tokio::time::sleep(self.retry_delay).await;
                        }
                    }
                },
            }
        }

        error!(
            id = %record.id(),
            attempts = self.max_attempts,
            error = %last_error,
            "Failed to publish to queue after retries"
        );

        Err(PublishError::Exhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedQueue;
    use serde_json::Number;

    fn record() -> CanonicalRecord {
        CanonicalRecord::new("tx-1", Number::from(100), "Merchant A").unwrap()
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let queue = Arc::new(ScriptedQueue::reliable());
        let publisher = Publisher::new(queue.clone(), 3);

        let delivery = publisher.publish(&record()).await.unwrap();
        assert_eq!(delivery.attempts, 1);
        assert_eq!(queue.send_attempts(), 1);
        assert_eq!(
            queue.delivered(),
            vec![r#"{"id":"tx-1","amount":100,"merchantName":"Merchant A"}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let queue = Arc::new(ScriptedQueue::failing_first(2));
        let publisher = Publisher::new(queue.clone(), 3);

        let delivery = publisher.publish(&record()).await.unwrap();
        assert_eq!(delivery.attempts, 3);
        assert_eq!(queue.send_attempts(), 3);
        assert_eq!(queue.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_resend_identical_body() {
        let queue = Arc::new(ScriptedQueue::failing_first(1));
        let publisher = Publisher::new(queue.clone(), 2);

        publisher.publish(&record()).await.unwrap();
        let bodies = queue.attempted_bodies();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_failure() {
        let queue = Arc::new(ScriptedQueue::always_failing());
        let publisher = Publisher::new(queue.clone(), 4);

        let err = publisher.publish(&record()).await.unwrap_err();
        match err {
            PublishError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("queue unavailable"));
            },
            other => panic!("Expected Exhausted, got {:?}", other),
        }
        assert_eq!(queue.send_attempts(), 4);
        assert!(queue.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_zero_attempts_still_sends_once() {
        let queue = Arc::new(ScriptedQueue::always_failing());
        let publisher = Publisher::new(queue.clone(), 0);

        assert_eq!(publisher.max_attempts(), 1);
        assert!(publisher.publish(&record()).await.is_err());
        assert_eq!(queue.send_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delay_between_attempts() {
        let queue = Arc::new(ScriptedQueue::failing_first(2));
        let publisher =
            Publisher::new(queue.clone(), 3).with_retry_delay(Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        publisher.publish(&record()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
