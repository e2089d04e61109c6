//! Message queue gateway
//!
//! [`MessageQueue`] accepts one text message per call; [`SqsQueue`] delivers
//! it to an SQS queue.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::{debug, info, instrument};

pub mod config;

/// Asynchronous delivery of discrete text messages
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Send one message body. Returns the broker's message id when it reports one.
    async fn send(&self, body: &str) -> Result<Option<String>>;
}

#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    config: config::QueueConfig,
}

impl SqsQueue {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: config::QueueConfig) -> Self {
        info!(queue_url = %config.queue_url, "Queue client initialized");

        Self {
            client: Client::new(sdk_config),
            config,
        }
    }

    pub fn queue_url(&self) -> &str {
        &self.config.queue_url
    }

    /// Create the queue named by the configured URL. CreateQueue is idempotent
    /// for an existing queue with the same attributes.
    #[instrument(skip(self), fields(queue_url = %self.config.queue_url))]
    pub async fn ensure_queue(&self) -> Result<String> {
        let name = self
            .config
            .queue_name()
            .context("Queue URL does not end in a queue name")?;

        let response = self
            .client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .with_context(|| format!("Failed to create queue {}", name))?;

        let url = response.queue_url().unwrap_or(name).to_string();
        info!(queue = %name, url = %url, "Queue ready");

        Ok(url)
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send(&self, body: &str) -> Result<Option<String>> {
        let response = self
            .client
            .send_message()
            .queue_url(&self.config.queue_url)
            .message_body(body)
            .send()
            .await
            .context("Failed to send message to SQS")?;

        debug!(message_id = ?response.message_id(), "SQS accepted message");

        Ok(response.message_id().map(|id| id.to_string()))
    }
}
