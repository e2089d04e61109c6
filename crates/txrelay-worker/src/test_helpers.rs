//! In-memory stand-ins for the object store and queue
//!
//! Used by unit and integration tests to drive the pipeline without S3 or SQS.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use txrelay_worker::test_helpers::{InMemoryStore, ScriptedQueue};
//!
//! let store = Arc::new(InMemoryStore::new().with_object("test.json", "{}"));
//! let queue = Arc::new(ScriptedQueue::failing_first(2));
//! assert!(store.contains("test.json"));
//! assert_eq!(queue.send_attempts(), 0);
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::queue::MessageQueue;
use crate::storage::ObjectStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call made against [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Fetch(String),
    Delete(String),
    Relocate { from: String, to: String },
}

/// Bucket held in a sorted map, so `list` returns keys in lexical order
#[derive(Default)]
pub struct InMemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    calls: Mutex<Vec<StoreCall>>,
    list_failures: Mutex<u32>,
    failing_fetches: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_relocates: Mutex<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            bucket: "test-bucket".to_string(),
            ..Default::default()
        }
    }

    pub fn with_object(self, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.put(key, body);
        self
    }

    pub fn put(&self, key: &str, body: impl Into<Vec<u8>>) {
        lock(&self.objects).insert(key.to_string(), body.into());
    }

    /// Make the next `count` list calls fail
    pub fn fail_next_lists(&self, count: u32) {
        *lock(&self.list_failures) = count;
    }

    pub fn fail_fetch(&self, key: &str) {
        lock(&self.failing_fetches).insert(key.to_string());
    }

    pub fn fail_delete(&self, key: &str) {
        lock(&self.failing_deletes).insert(key.to_string());
    }

    pub fn fail_relocate(&self, key: &str) {
        lock(&self.failing_relocates).insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::List))
            .count()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Delete(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: StoreCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.record(StoreCall::List);

        let mut failures = lock(&self.list_failures);
        if *failures > 0 {
            *failures -= 1;
            return Err(anyhow!("store unreachable"));
        }

        Ok(self.keys())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.record(StoreCall::Fetch(key.to_string()));
        // Suspend like real I/O so concurrent keys interleave
        tokio::task::yield_now().await;

        if lock(&self.failing_fetches).contains(key) {
            return Err(anyhow!("transient read error for {}", key));
        }

        lock(&self.objects)
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("NoSuchKey: {}", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.record(StoreCall::Delete(key.to_string()));

        if lock(&self.failing_deletes).contains(key) {
            return Err(anyhow!("delete rejected for {}", key));
        }

        lock(&self.objects).remove(key);
        Ok(())
    }

    async fn relocate(&self, from: &str, to: &str) -> Result<()> {
        self.record(StoreCall::Relocate {
            from: from.to_string(),
            to: to.to_string(),
        });

        if lock(&self.failing_relocates).contains(from) {
            return Err(anyhow!("copy rejected for {}", from));
        }

        let mut objects = lock(&self.objects);
        let body = objects
            .remove(from)
            .ok_or_else(|| anyhow!("NoSuchKey: {}", from))?;
        objects.insert(to.to_string(), body);
        Ok(())
    }
}

/// Queue whose sends fail according to a script
#[derive(Default)]
pub struct ScriptedQueue {
    /// Sends that fail before the queue starts accepting; `None` fails forever
    failures: Mutex<Option<u32>>,
    attempts: Mutex<Vec<String>>,
    delivered: Mutex<Vec<String>>,
    /// (sends in progress, most ever in progress)
    in_flight: Mutex<(usize, usize)>,
}

impl ScriptedQueue {
    pub fn reliable() -> Self {
        Self::failing_first(0)
    }

    pub fn failing_first(count: u32) -> Self {
        Self {
            failures: Mutex::new(Some(count)),
            ..Default::default()
        }
    }

    pub fn always_failing() -> Self {
        Self {
            failures: Mutex::new(None),
            ..Default::default()
        }
    }

    /// Every body passed to `send`, including failed attempts
    pub fn attempted_bodies(&self) -> Vec<String> {
        lock(&self.attempts).clone()
    }

    pub fn send_attempts(&self) -> usize {
        lock(&self.attempts).len()
    }

    /// Bodies the queue accepted
    pub fn delivered(&self) -> Vec<String> {
        lock(&self.delivered).clone()
    }

    /// Most sends that were ever awaiting the queue at the same time
    pub fn peak_concurrent_sends(&self) -> usize {
        lock(&self.in_flight).1
    }

    fn begin_send(&self) {
        let mut in_flight = lock(&self.in_flight);
        in_flight.0 += 1;
        in_flight.1 = in_flight.1.max(in_flight.0);
    }

    fn end_send(&self) {
        lock(&self.in_flight).0 -= 1;
    }
}

#[async_trait]
impl MessageQueue for ScriptedQueue {
    async fn send(&self, body: &str) -> Result<Option<String>> {
        lock(&self.attempts).push(body.to_string());

        self.begin_send();
        tokio::task::yield_now().await;
        self.end_send();

        let mut failures = lock(&self.failures);
        match failures.as_mut() {
            None => return Err(anyhow!("queue unavailable")),
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                return Err(anyhow!("queue unavailable"));
            },
            Some(_) => {},
        }

        let mut delivered = lock(&self.delivered);
        delivered.push(body.to_string());
        Ok(Some(format!("msg-{}", delivered.len())))
    }
}
