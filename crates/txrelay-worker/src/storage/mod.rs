//! Object store gateway
//!
//! The pipeline only needs to list, fetch, delete and relocate objects in one
//! bucket. [`ObjectStore`] is that capability; [`S3Storage`] backs it with
//! the AWS SDK.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use tracing::{debug, info, instrument};

pub mod config;

/// Key-addressed blob storage scoped to a single bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket the store is bound to, for logging
    fn bucket(&self) -> &str;

    /// List every key currently in the bucket. Order is not guaranteed.
    async fn list(&self) -> Result<Vec<String>>;

    /// Fetch the full object body
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete an object. Deleting a key that no longer exists succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Move an object to a new key in the same bucket
    async fn relocate(&self, from: &str, to: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: config::StorageConfig) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(config.path_style)
            .build();

        info!(bucket = %config.bucket, prefix = %config.prefix, "Storage client initialized");

        Self::from_client(Client::from_conf(s3_config), config)
    }

    pub fn from_client(client: Client, config: config::StorageConfig) -> Self {
        Self {
            client,
            bucket: config.bucket,
            prefix: config.prefix,
        }
    }

    /// Create the bucket if it does not exist yet. Returns `true` when created.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(&self) -> Result<bool> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            info!("Bucket already exists");
            return Ok(false);
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);

        // us-east-1 rejects an explicit location constraint
        if let Some(region) = self.client.config().region().map(|r| r.as_ref().to_string()) {
            if region != "us-east-1" {
                request = request.create_bucket_configuration(
                    CreateBucketConfiguration::builder()
                        .location_constraint(BucketLocationConstraint::from(region.as_str()))
                        .build(),
                );
            }
        }

        match request.send().await {
            Ok(_) => {
                info!("Bucket created");
                Ok(true)
            },
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_bucket_already_owned_by_you()) =>
            {
                info!("Bucket already owned by this account");
                Ok(false)
            },
            Err(e) => Err(e).context(format!("Failed to create bucket {}", self.bucket)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list(&self) -> Result<Vec<String>> {
        debug!("Listing objects in s3://{}/{}", self.bucket, self.prefix);

        let mut request = self.client.list_objects_v2().bucket(&self.bucket);
        if !self.prefix.is_empty() {
            request = request.prefix(&self.prefix);
        }

        let mut pages = request.into_paginator().send();
        let mut keys = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.context("Failed to list S3 objects")?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );
        }

        debug!("Listed {} objects", keys.len());

        Ok(keys)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: {}", key))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(data)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to delete from S3: {}", key))?;

        debug!("Deleted s3://{}/{}", self.bucket, key);

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn relocate(&self, from: &str, to: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source(&self.bucket, from))
            .key(to)
            .send()
            .await
            .with_context(|| format!("Failed to copy S3 object {} to {}", from, to))?;

        self.delete(from).await?;

        info!(
            "Moved s3://{}/{} to s3://{}/{}",
            self.bucket, from, self.bucket, to
        );

        Ok(())
    }
}

/// `CopySource` is `bucket/key` with the key URL-encoded, keeping `/` literal
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", bucket, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_source_plain_key() {
        assert_eq!(
            copy_source("test-bucket", "incoming/tx-1.json"),
            "test-bucket/incoming/tx-1.json"
        );
    }

    #[test]
    fn test_copy_source_encodes_segments() {
        assert_eq!(
            copy_source("test-bucket", "daily batch/tx #1.json"),
            "test-bucket/daily%20batch/tx%20%231.json"
        );
    }

    #[test]
    fn test_bucket_accessor() {
        let storage = S3Storage::from_client(
            Client::from_conf(
                aws_sdk_s3::Config::builder()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .build(),
            ),
            config::StorageConfig::for_localstack("test-bucket"),
        );

        assert_eq!(storage.bucket(), "test-bucket");
    }
}
