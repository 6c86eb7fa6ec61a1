//! # Retry Policy and Dead Letters
//!
//! Decides what happens to a pending workout the server keeps refusing.
//!
//! ## Policies
//!
//! - **Forever** (default): every failed record is retried on every pass
//! - **DeadLetter**: after `max_rejections` consecutive 4xx answers the
//!   record is moved to a separate dead-letter snapshot
//!
//! Only rejections (4xx) count. Network errors, timeouts and 5xx answers say
//! nothing about the payload and reset nothing either; any non-4xx outcome
//! clears the count. Counts live in memory for the running process.
//!
//! Dead-lettered records are never dropped: they can be listed, re-queued
//! or discarded explicitly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::client::offline::queue::{PendingQueue, PendingRecord, QueueError};
use crate::client::storage::LocalStorage;
use crate::shared::config::RetrySettings;

/// What to do with records the server rejects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    Forever,
    DeadLetter { max_rejections: u32 },
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        match settings.dead_letter_after {
            Some(max_rejections) => RetryPolicy::DeadLetter { max_rejections },
            None => RetryPolicy::Forever,
        }
    }
}

/// Per-record rejection counts
#[derive(Debug, Default)]
pub struct RejectionTracker {
    policy: RetryPolicy,
    rejections: RwLock<HashMap<String, u32>>,
}

impl RejectionTracker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            rejections: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Count a 4xx answer for `id`. Returns true when the record should be
    /// dead-lettered now.
    pub async fn record_rejection(&self, id: &str) -> bool {
        let RetryPolicy::DeadLetter { max_rejections } = self.policy else {
            return false;
        };

        let mut rejections = self.rejections.write().await;
        let count = rejections.entry(id.to_string()).or_insert(0);
        *count += 1;
        tracing::debug!("Workout {} rejected {} of {} times", id, count, max_rejections);
        *count >= max_rejections
    }

    /// Any non-4xx outcome resets the count
    pub async fn reset(&self, id: &str) {
        if self.policy == RetryPolicy::Forever {
            return;
        }
        self.rejections.write().await.remove(id);
    }

    /// Drop counts of records that left the queue
    pub async fn forget(&self, ids: &HashSet<String>) {
        if ids.is_empty() {
            return;
        }
        self.rejections.write().await.retain(|id, _| !ids.contains(id));
    }

    pub async fn rejections(&self, id: &str) -> u32 {
        self.rejections.read().await.get(id).copied().unwrap_or(0)
    }
}

/// Persisted snapshot of records moved out of the pending queue
#[derive(Debug)]
pub struct DeadLetterStore {
    records: PendingQueue,
}

impl DeadLetterStore {
    pub async fn open(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        Self {
            records: PendingQueue::open(storage, key).await,
        }
    }

    /// Store records, keeping their ids and payloads
    pub async fn push(&self, records: Vec<PendingRecord>) {
        if records.is_empty() {
            return;
        }
        tracing::warn!("Moving {} rejected workouts to dead letters", records.len());
        self.records.push_records(records).await;
    }

    pub async fn list(&self) -> Vec<PendingRecord> {
        self.records.snapshot().await
    }

    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.records.is_empty().await
    }

    /// Take a record out so it can be queued again
    pub async fn take(&self, id: &str) -> Result<PendingRecord, QueueError> {
        self.records.delete(id).await
    }

    /// Permanently discard a record
    pub async fn discard(&self, id: &str) -> Result<(), QueueError> {
        let record = self.records.delete(id).await?;
        tracing::info!("Discarded dead-lettered workout {}", record.id);
        Ok(())
    }
}
