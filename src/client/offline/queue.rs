//! # Pending Workout Queue
//!
//! Durable client-side queue of workouts that have not been confirmed by the
//! server yet. The whole ordered sequence is persisted as one JSON snapshot
//! under a fixed storage slot and rewritten on every mutation.
//!
//! ## Features
//!
//! - **Persistent Queue**: Records survive restarts through `LocalStorage`
//! - **Submission Order**: Insertion order is preserved across edits and passes
//! - **Fail-Soft Loading**: A missing or corrupt snapshot loads as empty
//! - **Batched Removal**: Set-based removal with a single snapshot write
//! - **Edit-Safe Removal**: `remove_unchanged` keeps records edited after they were read
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitlog::client::offline::queue::PendingQueue;
//! use fitlog::client::storage::MemoryStorage;
//! use fitlog::shared::Workout;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let queue = PendingQueue::open(Arc::new(MemoryStorage::new()), "fitlog.pendingWorkouts").await;
//! let record = queue.append(Workout::new("2024-01-01", "push")).await;
//! assert_eq!(queue.len().await, 1);
//! queue.delete(&record.id).await.unwrap();
//! # }
//! ```
//!
//! The in-memory copy is the source of truth for the running process. If a
//! snapshot write fails the error is logged and the in-memory queue stays
//! ahead of storage until the next successful write.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::client::storage::{LocalStorage, StorageError};
use crate::shared::Workout;

/// A workout waiting for server confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord {
    /// Client-generated, time-ordered identifier
    pub id: String,
    /// The workout to submit
    pub payload: Workout,
    /// Milliseconds since epoch; refreshed when the payload is edited
    pub enqueued_at: i64,
}

impl PendingRecord {
    /// Wrap a payload with a fresh id and timestamp
    pub fn new(payload: Workout) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            payload,
            enqueued_at: now_millis(),
        }
    }
}

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// No pending record has this id
    #[error("no pending workout with id {0}")]
    NotFound(String),
    /// Snapshot write failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Ordered, persisted queue of pending workouts
pub struct PendingQueue {
    storage: Arc<dyn LocalStorage>,
    key: String,
    records: Mutex<Vec<PendingRecord>>,
}

impl std::fmt::Debug for PendingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingQueue").field("key", &self.key).finish_non_exhaustive()
    }
}

impl PendingQueue {
    /// Open the queue stored under `key`, loading its snapshot
    pub async fn open(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let records = read_snapshot(storage.as_ref(), &key).await;
        if !records.is_empty() {
            tracing::info!("Loaded {} pending workouts from '{}'", records.len(), key);
        }
        Self {
            storage,
            key,
            records: Mutex::new(records),
        }
    }

    /// Read and deserialize the persisted snapshot.
    ///
    /// Returns an empty sequence when the slot is empty, unreadable or corrupt.
    pub async fn load(&self) -> Vec<PendingRecord> {
        read_snapshot(self.storage.as_ref(), &self.key).await
    }

    /// Overwrite the persisted snapshot with `records` in a single write
    pub async fn persist(&self, records: &[PendingRecord]) -> Result<(), StorageError> {
        let json = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize queue snapshot '{}': {}", self.key, e);
                return Err(StorageError::Unavailable(e.to_string()));
            }
        };

        if let Err(e) = self.storage.set_item(&self.key, &json).await {
            tracing::error!(
                "Failed to persist queue snapshot '{}' ({} records): {}",
                self.key,
                records.len(),
                e
            );
            return Err(e);
        }

        tracing::debug!("Persisted queue snapshot '{}': {} records", self.key, records.len());
        Ok(())
    }

    /// Add a payload at the end of the queue and persist
    pub async fn append(&self, payload: Workout) -> PendingRecord {
        let record = PendingRecord::new(payload);
        let mut records = self.records.lock().await;
        records.push(record.clone());
        // In-memory state stays authoritative if the write fails
        let _ = self.persist(&records).await;
        record
    }

    /// Append already-built records, keeping their ids
    pub async fn push_records(&self, new_records: Vec<PendingRecord>) {
        if new_records.is_empty() {
            return;
        }
        let mut records = self.records.lock().await;
        records.extend(new_records);
        let _ = self.persist(&records).await;
    }

    /// Remove every record whose id is in `ids`, persisting once.
    ///
    /// Returns the removed records. Absent ids are ignored; nothing is
    /// written when no record matched.
    pub async fn remove(&self, ids: &HashSet<String>) -> Vec<PendingRecord> {
        if ids.is_empty() {
            return Vec::new();
        }

        let mut records = self.records.lock().await;
        let (removed, kept): (Vec<_>, Vec<_>) =
            records.drain(..).partition(|record| ids.contains(&record.id));
        *records = kept;

        if !removed.is_empty() {
            let _ = self.persist(&records).await;
        }
        removed
    }

    /// Remove the given records, persisting once, unless they changed since.
    ///
    /// A record is only removed while it still equals the copy passed in, so
    /// an edit made after that copy was taken stays queued.
    pub async fn remove_unchanged(&self, sent: &[PendingRecord]) -> Vec<PendingRecord> {
        if sent.is_empty() {
            return Vec::new();
        }

        let mut records = self.records.lock().await;
        let (removed, kept): (Vec<_>, Vec<_>) =
            records.drain(..).partition(|record| sent.contains(record));
        *records = kept;

        if !removed.is_empty() {
            let _ = self.persist(&records).await;
        }
        removed
    }

    /// Replace the payload of a pending record in place and refresh its timestamp
    pub async fn update_payload(
        &self,
        id: &str,
        payload: Workout,
    ) -> Result<PendingRecord, QueueError> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;

        record.payload = payload;
        record.enqueued_at = now_millis();
        let updated = record.clone();

        let _ = self.persist(&records).await;
        Ok(updated)
    }

    /// Explicit user deletion of a pending record
    pub async fn delete(&self, id: &str) -> Result<PendingRecord, QueueError> {
        let ids = HashSet::from([id.to_string()]);
        self.remove(&ids)
            .await
            .pop()
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }

    /// Copy of the in-memory queue, in order
    pub async fn snapshot(&self) -> Vec<PendingRecord> {
        self.records.lock().await.clone()
    }

    /// Look up a pending record
    pub async fn get(&self, id: &str) -> Option<PendingRecord> {
        self.records.lock().await.iter().find(|r| r.id == id).cloned()
    }

    /// Number of pending records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the queue is empty
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Storage slot of this queue
    pub fn storage_key(&self) -> &str {
        &self.key
    }
}

async fn read_snapshot(storage: &dyn LocalStorage, key: &str) -> Vec<PendingRecord> {
    let json = match storage.get_item(key).await {
        Ok(Some(json)) => json,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::error!("Failed to read queue snapshot '{}': {}", key, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<PendingRecord>>(&json) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Discarding unreadable queue snapshot '{}': {}", key, e);
            Vec::new()
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
