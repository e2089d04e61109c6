//! TxRelay worker library
//!
//! Polls an S3 bucket for transaction JSON documents, validates and reshapes
//! each one, publishes it to an SQS queue and deletes the source object once
//! the queue has accepted the message.
//!
//! # Modules
//!
//! - [`config`]: environment configuration for AWS, storage, queue and pipeline
//! - [`storage`]: the [`storage::ObjectStore`] gateway and its S3 implementation
//! - [`queue`]: the [`queue::MessageQueue`] gateway and its SQS implementation
//! - [`pipeline`]: validation, transformation, publishing and the poll loop
//! - `test_helpers`: in-memory gateways for tests (`test-utils` feature)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use txrelay_worker::pipeline::{PollCycle, Publisher};
//! use txrelay_worker::test_helpers::{InMemoryStore, ScriptedQueue};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(InMemoryStore::new().with_object("bad.json", "not-json"));
//! let queue = Arc::new(ScriptedQueue::reliable());
//! let cycle = PollCycle::new(store.clone(), Publisher::new(queue, 3));
//!
//! let report = cycle.run_cycle(&CancellationToken::new()).await.unwrap();
//! assert_eq!(report.failed(), 1);
//! assert!(store.contains("bad.json"));
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod storage;

// In-memory gateways, only in test builds or with the test-utils feature
#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

pub use config::RelayConfig;
pub use error::{FailureKind, ProcessError, PublishError, SchemaViolation};
