/**
 * Workout Handlers
 *
 * # Routes
 *
 * - `GET /api/workouts` - list the caller's workouts
 * - `POST /api/workouts` - create; 201 with the stored document
 * - `GET /api/workouts/stats` - `WorkoutStats` over the caller's workouts
 * - `GET /api/workouts/{id}` - one workout
 * - `PUT /api/workouts/{id}` - replace the workout fields
 * - `DELETE /api/workouts/{id}` - remove; 204
 *
 * Request bodies are validated with `Workout::validate` before they reach
 * the store. Malformed JSON is reported in the same `{error, status}` shape
 * as every other failure.
 */
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::workouts::store::StoredWorkout;
use crate::shared::{Workout, WorkoutStats, WorkoutSubmission};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BackendError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| BackendError::handler(rejection.status(), rejection.body_text()))
}

pub async fn list_workouts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<StoredWorkout>>, BackendError> {
    let workouts = state.store.list(&user.user_id).await?;
    tracing::debug!("Listing {} workouts for {}", workouts.len(), user.user_id);
    Ok(Json(workouts))
}

pub async fn create_workout(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<WorkoutSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredWorkout>), BackendError> {
    let submission = json_body(payload)?;
    submission.workout.validate()?;

    let document = state.store.insert(&user.user_id, submission).await?;
    tracing::info!(
        "Created workout {} for {} (synced: {})",
        document.id,
        user.user_id,
        document.synced
    );
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn get_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StoredWorkout>, BackendError> {
    state
        .store
        .get(&user.user_id, &id)
        .await?
        .map(Json)
        .ok_or_else(BackendError::workout_not_found)
}

pub async fn update_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<Workout>, JsonRejection>,
) -> Result<Json<StoredWorkout>, BackendError> {
    let workout = json_body(payload)?;
    workout.validate()?;

    let document = state
        .store
        .update(&user.user_id, &id, workout)
        .await?
        .ok_or_else(BackendError::workout_not_found)?;
    tracing::info!("Updated workout {} for {}", id, user.user_id);
    Ok(Json(document))
}

pub async fn delete_workout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, BackendError> {
    if !state.store.delete(&user.user_id, &id).await? {
        return Err(BackendError::workout_not_found());
    }
    tracing::info!("Deleted workout {} for {}", id, user.user_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn workout_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<WorkoutStats>, BackendError> {
    let workouts = state.store.list(&user.user_id).await?;
    Ok(Json(WorkoutStats::from_workouts(
        workouts.iter().map(|doc| &doc.workout),
    )))
}
