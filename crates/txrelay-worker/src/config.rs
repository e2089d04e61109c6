//! Configuration management
//!
//! Everything is read from the environment (after loading `.env` if present).
//! Defaults target a LocalStack setup so `txrelay setup && txrelay run` works
//! out of the box.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::queue::config::QueueConfig;
use crate::storage::config::StorageConfig;

// ============================================================================
// Defaults
// ============================================================================

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default static access key (LocalStack accepts anything).
pub const DEFAULT_ACCESS_KEY: &str = "test";

/// Default static secret key.
pub const DEFAULT_SECRET_KEY: &str = "test";

/// Default publish attempts, inclusive of the first send.
pub const DEFAULT_MAX_PUBLISH_ATTEMPTS: u32 = 3;

/// Default delay between publish attempts. Zero retries immediately.
pub const DEFAULT_PUBLISH_RETRY_DELAY_MS: u64 = 0;

/// Default sleep between poll cycles (30 seconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default number of objects processed concurrently within a cycle.
pub const DEFAULT_MAX_CONCURRENT_OBJECTS: usize = 1;

/// Top-level configuration for the relay process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
    pub pipeline: PipelineConfig,
}

/// Connection settings shared by the S3 and SQS clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    /// Endpoint override for LocalStack or MinIO
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

/// Pipeline behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    pub max_publish_attempts: u32,
    pub publish_retry_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_concurrent_objects: usize,
    /// Where permanently failing objects are moved. `None` leaves them in place.
    pub dead_letter_prefix: Option<String>,
}

impl RelayConfig {
    /// Load configuration from `.env` and the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from the process environment only
    pub fn from_env() -> anyhow::Result<Self> {
        let aws = AwsConfig::from_env();
        let storage = StorageConfig::from_env(aws.endpoint.is_some())?;
        let queue = QueueConfig::from_env();
        let pipeline = PipelineConfig::from_env()?;

        let config = Self {
            aws,
            storage,
            queue,
            pipeline,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.aws.region.is_empty() {
            anyhow::bail!("AWS_REGION cannot be empty");
        }
        self.storage.validate()?;
        self.queue.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

impl AwsConfig {
    pub fn from_env() -> Self {
        Self {
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint: std::env::var("AWS_ENDPOINT_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            access_key: std::env::var("AWS_ACCESS_KEY_ID")
                .unwrap_or_else(|_| DEFAULT_ACCESS_KEY.to_string()),
            secret_key: std::env::var("AWS_SECRET_ACCESS_KEY")
                .unwrap_or_else(|_| DEFAULT_SECRET_KEY.to_string()),
        }
    }

    /// Build the shared SDK configuration both service clients are created from
    pub async fn load_sdk_config(&self) -> aws_config::SdkConfig {
        let credentials = aws_credential_types::Credentials::new(
            &self.access_key,
            &self.secret_key,
            None,
            None,
            "txrelay-static",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()))
            .credentials_provider(credentials);

        if let Some(ref endpoint) = self.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        loader.load().await
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: DEFAULT_ACCESS_KEY.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            max_publish_attempts: parse_env("MAX_RETRIES", DEFAULT_MAX_PUBLISH_ATTEMPTS)?,
            publish_retry_delay_ms: parse_env(
                "PUBLISH_RETRY_DELAY_MS",
                DEFAULT_PUBLISH_RETRY_DELAY_MS,
            )?,
            poll_interval_ms: parse_env("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            max_concurrent_objects: parse_env(
                "MAX_CONCURRENT_OBJECTS",
                DEFAULT_MAX_CONCURRENT_OBJECTS,
            )?,
            dead_letter_prefix: std::env::var("DEAD_LETTER_PREFIX")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_publish_attempts == 0 {
            anyhow::bail!("MAX_RETRIES must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("POLL_INTERVAL_MS must be greater than 0");
        }
        if self.max_concurrent_objects == 0 {
            anyhow::bail!("MAX_CONCURRENT_OBJECTS must be greater than 0");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn publish_retry_delay(&self) -> Duration {
        Duration::from_millis(self.publish_retry_delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_publish_attempts: DEFAULT_MAX_PUBLISH_ATTEMPTS,
            publish_retry_delay_ms: DEFAULT_PUBLISH_RETRY_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_concurrent_objects: DEFAULT_MAX_CONCURRENT_OBJECTS,
            dead_letter_prefix: None,
        }
    }
}

/// Read `name` and parse it, or return `default` when unset.
///
/// A set but unparsable value is an error rather than a silent fallback.
pub(crate) fn parse_env<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {:?} ({})", name, raw, e)),
        _ => Ok(default),
    }
}
