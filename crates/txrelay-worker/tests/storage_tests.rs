//! Live S3/SQS integration tests
//!
//! These tests exercise the AWS gateways against LocalStack (or MinIO for the
//! storage half).
//!
//! **Requirements**:
//! - LocalStack must be running and accessible
//! - AWS_ENDPOINT_URL must be set (e.g., "http://localhost:4566")
//! - Tests will be skipped if AWS_ENDPOINT_URL is not configured
//!
//! **Running tests**:
//! ```bash
//! AWS_ENDPOINT_URL=http://localhost:4566 cargo test --test storage_tests
//! ```

use aws_sdk_s3::primitives::ByteStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use txrelay_worker::config::AwsConfig;
use txrelay_worker::pipeline::{KeyOutcome, PollCycle, Publisher};
use txrelay_worker::queue::{config::QueueConfig, MessageQueue, SqsQueue};
use txrelay_worker::storage::{config::StorageConfig, ObjectStore, S3Storage};

struct Live {
    sdk_config: aws_config::SdkConfig,
    storage: S3Storage,
    bucket: String,
}

/// Setup helper that creates a bucket-scoped store if LocalStack is available
async fn setup() -> Option<Live> {
    if std::env::var("AWS_ENDPOINT_URL").is_err() {
        return None;
    }

    let sdk_config = AwsConfig::from_env().load_sdk_config().await;
    let bucket = format!("txrelay-test-{}", uuid::Uuid::new_v4().simple());
    let storage = S3Storage::new(&sdk_config, StorageConfig::for_localstack(&bucket));

    match storage.ensure_bucket().await {
        Ok(_) => Some(Live {
            sdk_config,
            storage,
            bucket,
        }),
        Err(e) => {
            eprintln!("Failed to create test bucket: {:#}", e);
            None
        },
    }
}

impl Live {
    async fn put(&self, key: &str, body: &str) {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .force_path_style(true)
            .build();
        aws_sdk_s3::Client::from_conf(config)
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .send()
            .await
            .unwrap();
    }

    async fn queue(&self) -> SqsQueue {
        let name = format!("txrelay-test-{}", uuid::Uuid::new_v4().simple());
        let queue = SqsQueue::new(
            &self.sdk_config,
            QueueConfig {
                queue_url: format!("http://localhost:4566/000000000000/{}", name),
            },
        );
        let url = queue.ensure_queue().await.unwrap();
        SqsQueue::new(&self.sdk_config, QueueConfig { queue_url: url })
    }
}

// ============================================================================
// Storage
// ============================================================================

#[tokio::test]
async fn test_ensure_bucket_is_idempotent() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    assert!(!live.storage.ensure_bucket().await.unwrap());
}

#[tokio::test]
async fn test_list_fetch_delete() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    live.put("a.json", r#"{"a":1}"#).await;
    live.put("nested/b.json", r#"{"b":2}"#).await;

    let mut keys = live.storage.list().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a.json", "nested/b.json"]);

    assert_eq!(live.storage.fetch("a.json").await.unwrap(), br#"{"a":1}"#.to_vec());

    live.storage.delete("a.json").await.unwrap();
    // Second delete of the same key still succeeds
    live.storage.delete("a.json").await.unwrap();
    assert_eq!(live.storage.list().await.unwrap(), vec!["nested/b.json"]);
}

#[tokio::test]
async fn test_fetch_missing_key_fails() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    assert!(live.storage.fetch("missing.json").await.is_err());
}

#[tokio::test]
async fn test_relocate_key_with_spaces() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    live.put("in box/tx 1.json", "not-json").await;
    live.storage
        .relocate("in box/tx 1.json", "dead/in box/tx 1.json")
        .await
        .unwrap();

    assert_eq!(live.storage.list().await.unwrap(), vec!["dead/in box/tx 1.json"]);
}

// ============================================================================
// Queue
// ============================================================================

#[tokio::test]
async fn test_send_returns_message_id() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    let queue = live.queue().await;
    let message_id = queue.send(r#"{"id":"tx-1"}"#).await.unwrap();
    assert!(message_id.is_some());
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_cycle_against_localstack() {
    let Some(live) = setup().await else {
        eprintln!("Skipping: AWS_ENDPOINT_URL not set");
        return;
    };

    live.put(
        "test.json",
        r#"{"transaction_id":"tx-12345","amount":150.0,"currency":"USD",
            "timestamp":"2024-01-15T10:30:00Z",
            "merchant":{"id":"m-789","name":"Example Corp"}}"#,
    )
    .await;
    live.put("bad.json", "not-json").await;

    let queue = Arc::new(live.queue().await);
    let storage = Arc::new(live.storage.clone());
    let cycle = PollCycle::new(storage.clone(), Publisher::new(queue, 3));

    let report = cycle.run_cycle(&CancellationToken::new()).await.unwrap();

    assert!(report.outcome("test.json").is_some_and(KeyOutcome::is_published));
    assert_eq!(report.outcome("bad.json"), Some(&KeyOutcome::Malformed));
    assert_eq!(storage.list().await.unwrap(), vec!["bad.json"]);
}
