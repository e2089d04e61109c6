//! TxRelay Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, errors, and logging for the TxRelay workspace.
//!
//! # Overview
//!
//! - **Types**: the canonical outbound transaction record sent to the queue
//! - **Error Handling**: record construction and serialization errors
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```
//! use txrelay_common::CanonicalRecord;
//!
//! let record = CanonicalRecord::new("tx-1", 100.into(), "Merchant A").unwrap();
//! assert_eq!(
//!     record.to_message_body().unwrap(),
//!     r#"{"id":"tx-1","amount":100,"merchantName":"Merchant A"}"#
//! );
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{RecordError, Result};
pub use types::CanonicalRecord;
