//! # Local Storage
//!
//! String-keyed durable slots used by the offline client, in the manner of a
//! browser's local storage: one slot holds the whole pending-workout
//! snapshot, another the dead-letter snapshot, another the cached user.
//!
//! ## Backends
//!
//! - `MemoryStorage`: in-process map with an optional byte quota
//! - `SqliteStorage`: SQLite key/value table (see `sqlite.rs`)

pub mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the storage quota
    #[error("storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded {
        /// Bytes the slots would occupy after the write
        needed: usize,
        /// Configured quota
        quota: usize,
    },
    /// Backend I/O failure
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),
    /// Storage is not reachable in this context
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string-keyed slots
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Read a slot
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Overwrite a slot in one write
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Clear a slot
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Create an empty storage without quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage whose slots may hold at most `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Number of successful `set_item` / `remove_item` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Total bytes held by all slots
    pub async fn used_bytes(&self) -> usize {
        let items = self.items.read().await;
        items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

#[async_trait]
impl LocalStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().await;
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
