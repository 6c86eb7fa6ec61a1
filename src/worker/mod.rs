//! # Background Worker
//!
//! Long-lived worker that caches the app shell for offline use, answers
//! fetches from that cache, and wakes open pages to sync their pending
//! workouts.
//!
//! ## Lifecycle
//!
//! - **install**: fetch every allow-listed route into `fitlog-cache-<version>`;
//!   one failure fails the whole install and nothing is stored
//! - **activate**: delete every cache that is not the current version
//! - **fetch**: cache-first for same-origin GETs outside the API namespace,
//!   with the cached root page as navigation fallback when offline
//! - **sync**: on `sync-workouts`, post `SYNC_WORKOUTS` to every client
//! - **message**: `SKIP_WAITING` activates immediately, `SYNC_WORKOUTS` is
//!   relayed to every client
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitlog::shared::AppConfig;
//! use fitlog::worker::{ServiceWorker, cache::CacheStorage, clients::ClientHub, fetch::HttpFetcher};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), fitlog::worker::WorkerError> {
//! let worker = ServiceWorker::new(
//!     AppConfig::default(),
//!     Arc::new(CacheStorage::new()),
//!     Arc::new(HttpFetcher::default()),
//!     ClientHub::new(),
//! )?;
//! worker.install().await?;
//! worker.activate().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod clients;
pub mod fetch;
pub mod registry;

use futures_util::future::try_join_all;
use reqwest::{Method, Url};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::client::sync::SYNC_TAG;
use crate::shared::{AppConfig, ClientMessage, WorkerCommand};
use cache::CacheStorage;
use clients::ClientHub;
use fetch::{FetchRequest, FetchResponse, Fetcher};
use registry::SyncRegistry;

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A precache route could not be fetched
    #[error("install failed for {route}: {reason}")]
    InstallFailed { route: String, reason: String },
    /// Neither the cache nor the network could answer
    #[error("offline and {url} is not cached")]
    Offline { url: String },
    /// Transport failure
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Lifecycle phase of a worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, not installed
    Parsed,
    /// Installed, waiting for the previous version to go away
    Waiting,
    Activated,
}

pub struct ServiceWorker {
    config: AppConfig,
    origin: Url,
    caches: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    clients: ClientHub,
    registry: Arc<SyncRegistry>,
    state: RwLock<WorkerState>,
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("origin", &self.origin.as_str())
            .field("cache", &self.config.cache_name())
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

impl ServiceWorker {
    /// Create a worker version serving the origin of `config.server_url`.
    ///
    /// `caches` and `clients` are shared between worker versions.
    pub fn new(
        config: AppConfig,
        caches: Arc<CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        clients: ClientHub,
    ) -> Result<Self, WorkerError> {
        let origin = Url::parse(&config.server_url)
            .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", config.server_url, e)))?;
        Ok(Self {
            config,
            origin,
            caches,
            fetcher,
            clients,
            registry: Arc::new(SyncRegistry::new()),
            state: RwLock::new(WorkerState::Parsed),
        })
    }

    /// Registry pages use to request background sync
    pub fn sync_registry(&self) -> Arc<SyncRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn clients(&self) -> &ClientHub {
        &self.clients
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Name of this version's cache
    pub fn cache_name(&self) -> String {
        self.config.cache_name()
    }

    /// Precache the allow-listed routes.
    ///
    /// Routes are fetched concurrently; the cache is only written when every
    /// route answered 2xx.
    pub async fn install(&self) -> Result<(), WorkerError> {
        let cache = self.cache_name();
        let entries = try_join_all(
            self.config
                .precache_routes
                .iter()
                .map(|route| self.precache_entry(route)),
        )
        .await?;

        tracing::info!("[Worker] Installed {} routes into {}", entries.len(), cache);
        self.caches.put_all(&cache, entries).await;
        *self.state.write().await = WorkerState::Waiting;
        Ok(())
    }

    async fn precache_entry(&self, route: &str) -> Result<(String, FetchResponse), WorkerError> {
        let url = self
            .origin
            .join(route)
            .map_err(|e| WorkerError::InvalidUrl(format!("{}: {}", route, e)))?;

        let response = self
            .fetcher
            .fetch(&FetchRequest::get(url.clone()))
            .await
            .map_err(|e| WorkerError::InstallFailed {
                route: route.to_string(),
                reason: e.to_string(),
            })?;
        if !response.is_success() {
            return Err(WorkerError::InstallFailed {
                route: route.to_string(),
                reason: format!("status {}", response.status),
            });
        }
        Ok((cache_key(&url), response))
    }

    /// Delete every cache but the current one. Returns the deleted names.
    pub async fn activate(&self) -> Vec<String> {
        let current = self.cache_name();
        let mut deleted = Vec::new();
        for name in self.caches.keys().await {
            if name != current && self.caches.delete(&name).await {
                tracing::info!("[Worker] Deleted old cache {}", name);
                deleted.push(name);
            }
        }
        *self.state.write().await = WorkerState::Activated;
        deleted
    }

    /// Answer a page request
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, WorkerError> {
        if request.method != Method::GET || request.url.origin() != self.origin.origin() {
            return self.fetcher.fetch(request).await;
        }
        if self.is_api_path(request.url.path()) {
            // API data is always fresh and never cached
            return self.fetcher.fetch(request).await;
        }

        let cache = self.cache_name();
        let key = cache_key(&request.url);
        if let Some(hit) = self.caches.match_key(&cache, &key).await {
            return Ok(hit);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.caches.put(&cache, key, response.clone()).await;
                }
                Ok(response)
            }
            Err(e) => {
                tracing::debug!("[Worker] Network failed for {}: {}", request.url, e);
                if request.is_navigation() {
                    if let Some(root) = self.caches.match_key(&cache, "/").await {
                        return Ok(root);
                    }
                }
                Err(WorkerError::Offline {
                    url: request.url.to_string(),
                })
            }
        }
    }

    /// Background-sync event. Returns the number of clients notified.
    pub fn sync(&self, tag: &str) -> usize {
        if tag != SYNC_TAG {
            tracing::debug!("[Worker] Ignoring sync tag '{}'", tag);
            return 0;
        }
        self.clients.post_all(ClientMessage::SyncWorkouts)
    }

    /// Message from a client
    pub async fn message(&self, command: WorkerCommand) {
        match command {
            WorkerCommand::SkipWaiting => {
                tracing::info!("[Worker] Skip waiting requested");
                self.activate().await;
            }
            WorkerCommand::SyncWorkouts => {
                self.clients.post_all(ClientMessage::SyncWorkouts);
            }
        }
    }

    /// Fire one sync event per pending registered tag.
    ///
    /// Returns the number of tags fired.
    pub fn connectivity_restored(&self) -> usize {
        let tags = self.registry.drain();
        for tag in &tags {
            self.sync(tag);
        }
        tags.len()
    }

    /// Whether the path contains the API namespace as whole segments
    fn is_api_path(&self, path: &str) -> bool {
        let namespace = self.config.api_namespace.trim_end_matches('/');
        path.ends_with(namespace) || path.contains(&format!("{}/", namespace))
    }
}

/// Cache key of a URL: path plus query
fn cache_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
