/**
 * Workout Store
 *
 * Documents are keyed by a generated `_id` and owned by one user. The
 * `WorkoutStore` trait is the seam a document database would plug into;
 * `MemoryWorkoutStore` keeps everything in process memory.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::{Workout, WorkoutSubmission};

/// Stored workout document, as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub workout: Workout,
    /// Set when the document was created by an offline sync pass
    #[serde(default)]
    pub synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredWorkout {
    fn new(user_id: &str, submission: WorkoutSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            workout: submission.workout,
            synced: submission.synced,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence of workout documents, scoped by owner
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// The user's workouts, newest date first
    async fn list(&self, user_id: &str) -> Result<Vec<StoredWorkout>, BackendError>;

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<StoredWorkout>, BackendError>;

    async fn insert(
        &self,
        user_id: &str,
        submission: WorkoutSubmission,
    ) -> Result<StoredWorkout, BackendError>;

    /// Replace the workout fields; `None` when the document does not exist
    async fn update(
        &self,
        user_id: &str,
        id: &str,
        workout: Workout,
    ) -> Result<Option<StoredWorkout>, BackendError>;

    /// Returns whether a document was removed
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, BackendError>;
}

/// In-memory `WorkoutStore`
#[derive(Debug, Default)]
pub struct MemoryWorkoutStore {
    documents: RwLock<HashMap<String, StoredWorkout>>,
}

impl MemoryWorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl WorkoutStore for MemoryWorkoutStore {
    async fn list(&self, user_id: &str) -> Result<Vec<StoredWorkout>, BackendError> {
        let mut workouts: Vec<StoredWorkout> = self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| doc.user_id == user_id)
            .cloned()
            .collect();
        workouts.sort_by(|a, b| {
            b.workout
                .date
                .cmp(&a.workout.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(workouts)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<StoredWorkout>, BackendError> {
        Ok(self
            .documents
            .read()
            .await
            .get(id)
            .filter(|doc| doc.user_id == user_id)
            .cloned())
    }

    async fn insert(
        &self,
        user_id: &str,
        submission: WorkoutSubmission,
    ) -> Result<StoredWorkout, BackendError> {
        let document = StoredWorkout::new(user_id, submission);
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        workout: Workout,
    ) -> Result<Option<StoredWorkout>, BackendError> {
        let mut documents = self.documents.write().await;
        let Some(document) = documents.get_mut(id).filter(|doc| doc.user_id == user_id) else {
            return Ok(None);
        };
        document.workout = workout;
        document.updated_at = Utc::now();
        Ok(Some(document.clone()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, BackendError> {
        let mut documents = self.documents.write().await;
        if documents.get(id).is_some_and(|doc| doc.user_id == user_id) {
            documents.remove(id);
            return Ok(true);
        }
        Ok(false)
    }
}
