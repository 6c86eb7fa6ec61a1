//! # Resource Cache
//!
//! Named caches of responses keyed by request path, owned by the worker.
//! Each worker version writes to its own cache (`fitlog-cache-<version>`);
//! activation of a newer version deletes the older ones.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::worker::fetch::FetchResponse;

type Entries = HashMap<String, FetchResponse>;

#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: RwLock<HashMap<String, Entries>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a batch of entries at once; creates the cache if needed
    pub async fn put_all(&self, cache: &str, entries: Vec<(String, FetchResponse)>) {
        let mut caches = self.caches.write().await;
        caches.entry(cache.to_string()).or_default().extend(entries);
    }

    pub async fn put(&self, cache: &str, key: impl Into<String>, response: FetchResponse) {
        self.put_all(cache, vec![(key.into(), response)]).await;
    }

    /// Cached response for `key` in `cache`
    pub async fn match_key(&self, cache: &str, key: &str) -> Option<FetchResponse> {
        self.caches.read().await.get(cache)?.get(key).cloned()
    }

    /// Delete a whole cache; returns whether it existed
    pub async fn delete(&self, cache: &str) -> bool {
        self.caches.write().await.remove(cache).is_some()
    }

    pub async fn has(&self, cache: &str) -> bool {
        self.caches.read().await.contains_key(cache)
    }

    /// Names of all caches, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries in `cache`
    pub async fn len(&self, cache: &str) -> usize {
        self.caches.read().await.get(cache).map_or(0, HashMap::len)
    }
}
