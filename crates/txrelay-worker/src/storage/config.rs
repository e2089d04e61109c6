use serde::{Deserialize, Serialize};
use std::env;

use crate::config::parse_env;

/// Default source bucket.
pub const DEFAULT_BUCKET: &str = "test-bucket";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    /// Only keys under this prefix are polled; empty means the whole bucket
    pub prefix: String,
    pub path_style: bool,
}

impl StorageConfig {
    /// Path-style addressing defaults to on when an endpoint override is in
    /// use, since LocalStack and MinIO do not serve virtual-host buckets.
    pub fn from_env(has_endpoint: bool) -> anyhow::Result<Self> {
        Ok(Self {
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            prefix: env::var("S3_PREFIX").unwrap_or_default(),
            path_style: parse_env("S3_PATH_STYLE", has_endpoint)?,
        })
    }

    pub fn for_localstack(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            path_style: true,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.is_empty() {
            anyhow::bail!("S3_BUCKET cannot be empty");
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: String::new(),
            path_style: false,
        }
    }
}
