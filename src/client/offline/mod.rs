//! # Offline Workout Submission
//!
//! The single entry point UI forms use to submit a workout. A submission is
//! sent directly when the device is online; when it is offline, or the direct
//! attempt fails for any reason, the workout is queued locally and synced
//! later by the sync engine.
//!
//! ## Architecture
//!
//! - **Submission Façade** (this module): direct attempt with offline fallback
//! - **Pending Queue**: durable, ordered queue of unsynced workouts
//! - **Retry**: retry policy and dead-letter snapshot
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitlog::client::offline::{Submission, WorkoutSubmitter};
//! use fitlog::shared::Workout;
//!
//! # async fn example(submitter: &WorkoutSubmitter) -> Result<(), fitlog::client::offline::SyncError> {
//! match submitter.submit(Workout::new("2024-01-01", "push")).await? {
//!     Submission::Synced { server_id, .. } => println!("saved as {}", server_id),
//!     Submission::Queued { local_id } => println!("saved offline as {}", local_id),
//! }
//! # Ok(())
//! # }
//! ```

pub mod queue;
pub mod retry;

pub use queue::{PendingQueue, PendingRecord, QueueError};
pub use retry::{DeadLetterStore, RejectionTracker, RetryPolicy};

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::client::api_client::WorkoutApi;
use crate::client::sync::{BackgroundWake, ConnectivityState};
use crate::shared::{Workout, WorkoutSubmission};

/// Sync subsystem errors surfaced to callers
#[derive(Debug, Error)]
pub enum SyncError {
    /// One-time environment initialization has not completed
    #[error("offline sync is not initialized yet")]
    NotReady,
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Confirmed by the server
    Synced { server_id: String, body: Value },
    /// Stored locally, will be synced later
    Queued { local_id: String },
}

impl Submission {
    /// Identifier of the submitted workout, server or local
    pub fn id(&self) -> &str {
        match self {
            Submission::Synced { server_id, .. } => server_id,
            Submission::Queued { local_id } => local_id,
        }
    }

    /// Whether the workout was stored offline
    pub fn is_offline(&self) -> bool {
        matches!(self, Submission::Queued { .. })
    }
}

/// Submission façade
pub struct WorkoutSubmitter {
    queue: Arc<PendingQueue>,
    api: Arc<dyn WorkoutApi>,
    state: Arc<ConnectivityState>,
    wake: BackgroundWake,
}

impl std::fmt::Debug for WorkoutSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSubmitter")
            .field("queue", &self.queue)
            .field("state", &self.state)
            .field("wake", &self.wake)
            .finish_non_exhaustive()
    }
}

impl WorkoutSubmitter {
    pub fn new(
        queue: Arc<PendingQueue>,
        api: Arc<dyn WorkoutApi>,
        state: Arc<ConnectivityState>,
        wake: BackgroundWake,
    ) -> Self {
        Self {
            queue,
            api,
            state,
            wake,
        }
    }

    /// Submit an already validated workout.
    ///
    /// Never loses the workout: any failure of the direct attempt falls back
    /// to the queue.
    pub async fn submit(&self, workout: Workout) -> Result<Submission, SyncError> {
        if !self.state.is_ready() {
            return Err(SyncError::NotReady);
        }

        if self.state.is_online() {
            let submission = WorkoutSubmission::synced(workout.clone());
            match self.api.create_workout(&submission).await {
                Ok(response) => {
                    let server_id = response.server_id().unwrap_or_else(|| {
                        let local_id = Uuid::now_v7().to_string();
                        tracing::warn!(
                            "Server accepted workout without an id, using local id {}",
                            local_id
                        );
                        local_id
                    });
                    tracing::info!("Workout submitted: {}", server_id);
                    return Ok(Submission::Synced {
                        server_id,
                        body: response.body,
                    });
                }
                Err(e) => {
                    if e.is_network() {
                        self.state.set_online(false);
                    }
                    tracing::warn!("Direct submission failed, saving offline: {}", e);
                }
            }
        }

        Ok(self.enqueue(workout).await)
    }

    async fn enqueue(&self, workout: Workout) -> Submission {
        let was_empty = self.queue.is_empty().await;
        let record = self.queue.append(workout).await;
        tracing::info!("Workout saved offline: {}", record.id);
        self.wake.on_enqueued(was_empty).await;
        Submission::Queued {
            local_id: record.id,
        }
    }

    /// Edit a workout that has not been synced yet
    pub async fn update_pending(
        &self,
        id: &str,
        workout: Workout,
    ) -> Result<PendingRecord, SyncError> {
        Ok(self.queue.update_payload(id, workout).await?)
    }

    /// Delete a workout that has not been synced yet
    pub async fn delete_pending(&self, id: &str) -> Result<(), SyncError> {
        self.queue.delete(id).await?;
        Ok(())
    }

    /// Workouts waiting to be synced, in submission order
    pub async fn pending(&self) -> Vec<PendingRecord> {
        self.queue.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api_client::{ApiError, CreateResponse};
    use crate::client::storage::MemoryStorage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedApi {
        result: fn() -> Result<CreateResponse, ApiError>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl WorkoutApi for FixedApi {
        async fn create_workout(
            &self,
            submission: &WorkoutSubmission,
        ) -> Result<CreateResponse, ApiError> {
            assert!(submission.synced);
            *self.calls.lock().unwrap() += 1;
            (self.result)()
        }
    }

    async fn build_submitter(
        result: fn() -> Result<CreateResponse, ApiError>,
        online: bool,
    ) -> (WorkoutSubmitter, Arc<FixedApi>, Arc<ConnectivityState>) {
        let api = Arc::new(FixedApi { result, calls: Mutex::new(0) });
        let queue = Arc::new(PendingQueue::open(Arc::new(MemoryStorage::new()), "q").await);
        let state = Arc::new(ConnectivityState::new(online));
        state.mark_ready();
        let submitter =
            WorkoutSubmitter::new(queue, api.clone(), state.clone(), BackgroundWake::default());
        (submitter, api, state)
    }

    fn workout() -> Workout {
        Workout::new("2024-01-01", "push")
    }

    #[tokio::test]
    async fn test_online_success_returns_server_id() {
        let (submitter, _, _) =
            build_submitter(|| Ok(CreateResponse { status: 201, body: json!({"_id": "srv-1"}) }), true)
                .await;

        let result = submitter.submit(workout()).await.unwrap();
        assert_eq!(result.id(), "srv-1");
        assert!(!result.is_offline());
        assert!(submitter.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_success_without_id_uses_local_id() {
        let (submitter, _, _) =
            build_submitter(|| Ok(CreateResponse { status: 200, body: Value::Null }), true).await;

        let result = submitter.submit(workout()).await.unwrap();
        assert!(matches!(result, Submission::Synced { .. }));
        assert!(!result.id().is_empty());
    }

    #[tokio::test]
    async fn test_offline_queues_without_calling_api() {
        let (submitter, api, _) =
            build_submitter(|| Ok(CreateResponse { status: 201, body: Value::Null }), false).await;

        let result = submitter.submit(workout()).await.unwrap();
        assert!(result.is_offline());
        assert_eq!(*api.calls.lock().unwrap(), 0);
        assert_eq!(submitter.pending().await[0].id, result.id());
    }

    #[tokio::test]
    async fn test_server_error_falls_back_but_stays_online() {
        let (submitter, _, state) = build_submitter(
            || Err(ApiError::Status { status: 500, body: "boom".into() }),
            true,
        )
        .await;

        let result = submitter.submit(workout()).await.unwrap();
        assert!(result.is_offline());
        assert!(state.is_online());
    }

    #[tokio::test]
    async fn test_network_error_flips_offline() {
        let (submitter, _, state) =
            build_submitter(|| Err(ApiError::Network("refused".into())), true).await;

        let result = submitter.submit(workout()).await.unwrap();
        assert!(result.is_offline());
        assert!(!state.is_online());
    }

    #[tokio::test]
    async fn test_not_ready() {
        let api = Arc::new(FixedApi {
            result: || Ok(CreateResponse { status: 201, body: Value::Null }),
            calls: Mutex::new(0),
        });
        let queue = Arc::new(PendingQueue::open(Arc::new(MemoryStorage::new()), "q").await);
        let submitter = WorkoutSubmitter::new(
            queue,
            api,
            Arc::new(ConnectivityState::new(true)),
            BackgroundWake::default(),
        );

        assert!(matches!(submitter.submit(workout()).await, Err(SyncError::NotReady)));
    }

    #[tokio::test]
    async fn test_edit_and_delete_pending() {
        let (submitter, _, _) =
            build_submitter(|| Ok(CreateResponse { status: 201, body: Value::Null }), false).await;
        let id = submitter.submit(workout()).await.unwrap().id().to_string();

        let updated = submitter
            .update_pending(&id, workout().with_notes("edited"))
            .await
            .unwrap();
        assert_eq!(updated.payload.notes, "edited");

        submitter.delete_pending(&id).await.unwrap();
        assert!(submitter.pending().await.is_empty());
        assert!(matches!(
            submitter.delete_pending(&id).await,
            Err(SyncError::Queue(QueueError::NotFound(_)))
        ));
    }
}
