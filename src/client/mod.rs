//! # Offline Workout Client
//!
//! Client side of the offline-first workout sync: submissions that survive
//! being offline and are reconciled with the server once connectivity returns.
//!
//! ## Architecture
//!
//! - **Storage**: durable string-keyed slots (`storage`)
//! - **Offline**: submission façade, pending queue, retry policy (`offline`)
//! - **Sync**: sync engine, connectivity monitor, background wake (`sync`)
//! - **Environment**: host capabilities passed in explicitly (`environment`)
//! - **API Client**: HTTP create endpoint (`api_client`)
//!
//! `SyncClient` wires these together from a configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitlog::client::{Config, SyncClient};
//! use fitlog::client::environment::{Environment, ManualNetworkSignal};
//! use fitlog::shared::Workout;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let network = Arc::new(ManualNetworkSignal::new(true));
//! let mut client = SyncClient::connect(Config::from_env()?, Environment::interactive(network)).await?;
//! client.start(None);
//!
//! let submission = client.submitter().submit(Workout::new("2024-01-01", "push")).await?;
//! println!("{} (offline: {})", submission.id(), submission.is_offline());
//! println!("{}", client.status().await.label());
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod config;
pub mod environment;
pub mod offline;
pub mod session;
pub mod storage;
pub mod sync;

pub use api_client::{ApiError, CreateResponse, HttpWorkoutApi, WorkoutApi};
pub use config::Config;
pub use environment::{Environment, ManualNetworkSignal, NetworkEvent, NetworkSignal};
pub use offline::{Submission, SyncError, WorkoutSubmitter};
pub use sync::{PassReport, SyncEngine, SyncStatus};

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::shared::ClientMessage;
use offline::{DeadLetterStore, PendingQueue, PendingRecord, RejectionTracker, RetryPolicy};
use session::UserCache;
use storage::{LocalStorage, SqliteStorage, StorageError};
use sync::network_monitor::MonitorTiming;
use sync::{BackgroundWake, ConnectivityMonitor, ConnectivityState};

/// Errors while setting up the client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Wired sync subsystem
pub struct SyncClient {
    config: Config,
    environment: Environment,
    engine: Arc<SyncEngine>,
    submitter: WorkoutSubmitter,
    users: UserCache,
    monitor: Option<ConnectivityMonitor>,
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("server_url", &self.config.server_url())
            .field("environment", &self.environment)
            .field("engine", &self.engine)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl SyncClient {
    /// Wire the client over the given storage and API
    pub async fn new(
        config: Config,
        environment: Environment,
        storage: Arc<dyn LocalStorage>,
        api: Arc<dyn WorkoutApi>,
    ) -> Self {
        let app = config.app();
        let queue =
            Arc::new(PendingQueue::open(Arc::clone(&storage), app.queue_storage_key.clone()).await);
        let dead_letters = Arc::new(
            DeadLetterStore::open(Arc::clone(&storage), app.dead_letter_storage_key.clone()).await,
        );
        let users = UserCache::new(Arc::clone(&storage), app.user_storage_key.clone());

        let state = Arc::new(ConnectivityState::new(environment.network.is_online()));
        let policy = RetryPolicy::from(&app.retry);
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&queue),
            Arc::clone(&api),
            Arc::clone(&state),
            RejectionTracker::new(policy),
            dead_letters,
        ));
        let submitter = WorkoutSubmitter::new(
            queue,
            api,
            state,
            BackgroundWake::new(environment.background.clone()),
        );

        Self {
            config,
            environment,
            engine,
            submitter,
            users,
            monitor: None,
        }
    }

    /// Wire the client over the default SQLite file and the HTTP API
    pub async fn connect(config: Config, environment: Environment) -> Result<Self, ClientError> {
        let storage: Arc<dyn LocalStorage> = Arc::new(SqliteStorage::open_default().await?);
        let api: Arc<dyn WorkoutApi> = Arc::new(HttpWorkoutApi::new(config.clone())?);
        Ok(Self::new(config, environment, storage, api).await)
    }

    /// Initialize connectivity and start the monitor.
    ///
    /// `worker_messages` is the background worker's client channel, if any.
    /// Calling `start` again restarts the monitor.
    pub fn start(&mut self, worker_messages: Option<broadcast::Receiver<ClientMessage>>) {
        let timing = MonitorTiming {
            settle_delay: self.config.settle_delay(),
            poll_interval: self.config.poll_interval(),
        };
        self.monitor = Some(ConnectivityMonitor::start(
            &self.environment,
            Arc::clone(&self.engine),
            timing,
            worker_messages,
        ));
    }

    /// Stop the monitor
    pub fn shutdown(&mut self) {
        if let Some(mut monitor) = self.monitor.take() {
            monitor.shutdown();
        }
    }

    pub fn submitter(&self) -> &WorkoutSubmitter {
        &self.submitter
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn users(&self) -> &UserCache {
        &self.users
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a pass now (e.g. a "sync" button)
    pub async fn sync_now(&self) -> Option<PassReport> {
        self.engine.run_pass().await
    }

    /// Snapshot for a pending/offline indicator
    pub async fn status(&self) -> SyncStatus {
        let state = self.engine.state();
        SyncStatus {
            is_online: state.is_online(),
            is_ready: state.is_ready(),
            is_syncing: self.engine.is_syncing(),
            pending: self.engine.queue().len().await,
            dead_lettered: self.engine.dead_letters().len().await,
            last_pass_at: self.engine.last_pass_at().await,
        }
    }

    /// Records parked after repeated rejections
    pub async fn dead_letters(&self) -> Vec<PendingRecord> {
        self.engine.dead_letters().list().await
    }

    /// Move a dead-lettered record back to the end of the queue
    pub async fn requeue_dead_letter(&self, id: &str) -> Result<PendingRecord, SyncError> {
        let record = self.engine.dead_letters().take(id).await?;
        self.engine.queue().push_records(vec![record.clone()]).await;
        tracing::info!("Re-queued dead-lettered workout {}", record.id);
        Ok(record)
    }

    /// Drop a dead-lettered record for good
    pub async fn discard_dead_letter(&self, id: &str) -> Result<(), SyncError> {
        Ok(self.engine.dead_letters().discard(id).await?)
    }
}
