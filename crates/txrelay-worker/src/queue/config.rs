use serde::{Deserialize, Serialize};
use std::env;

/// Default queue URL (the LocalStack queue created by `txrelay setup`).
pub const DEFAULT_QUEUE_URL: &str = "http://localhost:4566/000000000000/test-queue";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    pub queue_url: String,
}

impl QueueConfig {
    pub fn from_env() -> Self {
        Self {
            queue_url: env::var("SQS_QUEUE_URL").unwrap_or_else(|_| DEFAULT_QUEUE_URL.to_string()),
        }
    }

    /// The queue name is the last path segment of the URL
    pub fn queue_name(&self) -> Option<&str> {
        self.queue_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !name.contains(':'))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.queue_url.is_empty() {
            anyhow::bail!("SQS_QUEUE_URL cannot be empty");
        }
        if self.queue_name().is_none() {
            anyhow::bail!("SQS_QUEUE_URL has no queue name: {}", self.queue_url);
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: DEFAULT_QUEUE_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_from_url() {
        let config = QueueConfig::default();
        assert_eq!(config.queue_name(), Some("test-queue"));

        let config = QueueConfig {
            queue_url: "https://sqs.eu-west-1.amazonaws.com/123456789012/transactions/".to_string(),
        };
        assert_eq!(config.queue_name(), Some("transactions"));
    }

    #[test]
    fn test_url_without_name_rejected() {
        let config = QueueConfig {
            queue_url: "http://localhost:4566".to_string(),
        };
        assert!(config.validate().is_err());

        let config = QueueConfig {
            queue_url: String::new(),
        };
        assert!(config.validate().is_err());
    }
}
