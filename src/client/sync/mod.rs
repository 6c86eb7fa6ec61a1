//! # Sync Engine
//!
//! Drains the pending-workout queue against the remote API.
//!
//! ## Architecture
//!
//! - **Engine** (this module): one sync pass over a snapshot of the queue
//! - **Network Monitor**: connectivity state and the listener that triggers passes
//! - **Scheduler**: settle delay and safety-net polling
//! - **Background**: page-side background-sync registration
//! - **Sync State / Metrics**: status snapshot and pass counters
//!
//! ## Pass semantics
//!
//! A pass runs only when the environment is ready, the device is online and
//! the queue is non-empty. Records are sent one at a time in queue order; a
//! failure never aborts the pass. Records confirmed with a 2xx are removed in
//! one batched write at the end, failed records stay where they were. A
//! record edited while its old payload was being sent stays queued and goes
//! out again with the edit. Every registered callback runs exactly once after
//! each executed pass.
//!
//! Passes are not serialized. Records already claimed by an in-flight pass
//! are skipped by an overlapping one, so no record is sent twice
//! concurrently. Claims are released when a pass ends or is dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # use fitlog::client::sync::SyncEngine;
//! # async fn example(engine: &SyncEngine) {
//! let id = engine.on_sync(|| println!("pending list changed"));
//! if let Some(report) = engine.run_pass().await {
//!     println!("{} synced, {} left", report.succeeded, report.remaining);
//! }
//! engine.remove_callback(id);
//! # }
//! ```

pub mod background;
pub mod metrics;
pub mod network_monitor;
pub mod scheduler;
pub mod sync_state;

pub use background::{BackgroundWake, SYNC_TAG};
pub use metrics::SyncMetrics;
pub use network_monitor::{ConnectivityMonitor, ConnectivityState};
pub use scheduler::SyncScheduler;
pub use sync_state::SyncStatus;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;

use crate::client::api_client::WorkoutApi;
use crate::client::offline::queue::{PendingQueue, PendingRecord};
use crate::client::offline::retry::{DeadLetterStore, RejectionTracker};
use crate::shared::WorkoutSubmission;

/// Zero-argument completion callback
pub type SyncCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `on_sync`, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Outcome of one executed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Records sent in this pass
    pub attempted: usize,
    pub succeeded: usize,
    /// Records left in the queue for the next pass
    pub failed: usize,
    pub dead_lettered: usize,
    /// Queue length after the pass
    pub remaining: usize,
}

/// Sync pass executor
pub struct SyncEngine {
    queue: Arc<PendingQueue>,
    api: Arc<dyn WorkoutApi>,
    state: Arc<ConnectivityState>,
    rejections: RejectionTracker,
    dead_letters: Arc<DeadLetterStore>,
    callbacks: Mutex<Vec<(CallbackId, SyncCallback)>>,
    next_callback: AtomicU64,
    /// Ids held by in-flight passes
    claimed: Mutex<HashSet<String>>,
    in_flight: AtomicUsize,
    metrics: RwLock<SyncMetrics>,
    last_pass_at: RwLock<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("queue", &self.queue)
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(
        queue: Arc<PendingQueue>,
        api: Arc<dyn WorkoutApi>,
        state: Arc<ConnectivityState>,
        rejections: RejectionTracker,
        dead_letters: Arc<DeadLetterStore>,
    ) -> Self {
        Self {
            queue,
            api,
            state,
            rejections,
            dead_letters,
            callbacks: Mutex::new(Vec::new()),
            next_callback: AtomicU64::new(1),
            claimed: Mutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            metrics: RwLock::new(SyncMetrics::new()),
            last_pass_at: RwLock::new(None),
        }
    }

    /// Register a callback run after every executed pass
    pub fn on_sync<F>(&self, callback: F) -> CallbackId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_callback.fetch_add(1, Ordering::SeqCst));
        lock(&self.callbacks).push((id, Arc::new(callback)));
        id
    }

    /// Unregister a callback; returns whether it was registered
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut callbacks = lock(&self.callbacks);
        let before = callbacks.len();
        callbacks.retain(|(registered, _)| *registered != id);
        callbacks.len() != before
    }

    /// Run one sync pass.
    ///
    /// Returns `None` when the pass was a no-op: not ready, offline, empty
    /// queue, or every record already claimed by another pass. No-op passes
    /// make no calls, write nothing and invoke no callbacks.
    pub async fn run_pass(&self) -> Option<PassReport> {
        if !self.state.is_ready() || !self.state.is_online() {
            return None;
        }
        if self.queue.is_empty().await {
            return None;
        }

        let claim = self.claim(self.queue.snapshot().await);
        if claim.records.is_empty() {
            tracing::debug!("All pending workouts are claimed by a running pass");
            return None;
        }

        let started = Instant::now();
        let attempted = claim.records.len();
        tracing::info!("Sync pass started: {} pending workouts", attempted);

        let mut succeeded = HashSet::new();
        let mut rejected = HashSet::new();
        let mut failed = 0;

        for record in &claim.records {
            let submission = WorkoutSubmission::synced(record.payload.clone());
            match self.api.create_workout(&submission).await {
                Ok(response) => {
                    tracing::debug!("Workout {} synced ({})", record.id, response.status);
                    self.rejections.reset(&record.id).await;
                    succeeded.insert(record.id.clone());
                }
                Err(e) if e.is_rejection() => {
                    tracing::warn!("Workout {} rejected: {}", record.id, e);
                    failed += 1;
                    if self.rejections.record_rejection(&record.id).await {
                        rejected.insert(record.id.clone());
                    }
                }
                Err(e) => {
                    tracing::warn!("Workout {} failed to sync: {}", record.id, e);
                    self.rejections.reset(&record.id).await;
                    failed += 1;
                }
            }
        }

        // One batched write for everything leaving the queue. Records edited
        // while their old payload was in flight stay queued.
        let leaving: Vec<PendingRecord> = claim
            .records
            .iter()
            .filter(|record| succeeded.contains(&record.id) || rejected.contains(&record.id))
            .cloned()
            .collect();
        let removed = self.queue.remove_unchanged(&leaving).await;
        let removed_ids: HashSet<String> = removed.iter().map(|r| r.id.clone()).collect();
        let dead: Vec<PendingRecord> = removed
            .into_iter()
            .filter(|record| rejected.contains(&record.id))
            .collect();
        let dead_lettered = dead.len();
        self.dead_letters.push(dead).await;
        self.rejections.forget(&removed_ids).await;

        let remaining = self.queue.len().await;

        self.metrics
            .write()
            .await
            .record_pass(started, succeeded.len(), failed, dead_lettered);
        *self.last_pass_at.write().await = Some(Utc::now());
        drop(claim);

        let report = PassReport {
            attempted,
            succeeded: succeeded.len(),
            failed: failed - dead_lettered,
            dead_lettered,
            remaining,
        };
        tracing::info!(
            "Sync pass finished: {} synced, {} failed, {} remaining",
            report.succeeded,
            report.failed,
            report.remaining
        );

        self.notify();
        Some(report)
    }

    /// Whether any pass is in flight
    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn metrics(&self) -> SyncMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn last_pass_at(&self) -> Option<DateTime<Utc>> {
        *self.last_pass_at.read().await
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn state(&self) -> &Arc<ConnectivityState> {
        &self.state
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterStore> {
        &self.dead_letters
    }

    /// Keep the records no other pass holds and mark them as held.
    ///
    /// The returned claim counts as an in-flight pass until it is dropped,
    /// including when the pass future is cancelled mid-await.
    fn claim(&self, snapshot: Vec<PendingRecord>) -> Claim<'_> {
        let records: Vec<PendingRecord> = {
            let mut claimed = lock(&self.claimed);
            snapshot
                .into_iter()
                .filter(|record| claimed.insert(record.id.clone()))
                .collect()
        };
        if !records.is_empty() {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        Claim {
            engine: self,
            records,
        }
    }

    fn notify(&self) {
        // Snapshot so a callback may register or unregister others
        let callbacks: Vec<SyncCallback> =
            lock(&self.callbacks).iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback();
        }
    }
}

/// Records held by one pass, released on drop
struct Claim<'a> {
    engine: &'a SyncEngine,
    records: Vec<PendingRecord>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let mut claimed = lock(&self.engine.claimed);
        for record in &self.records {
            claimed.remove(&record.id);
        }
        self.engine.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
