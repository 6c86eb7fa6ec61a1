/**
 * API Routes
 *
 * Mounts the workout handlers under `/api`. `/api/workouts/stats` is a
 * static segment and wins over the `{id}` capture.
 */
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::backend::server::state::AppState;
use crate::backend::workouts::{
    create_workout, delete_workout, get_workout, list_workouts, update_workout, workout_stats,
};

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Add the `/api` routes to `router`
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/health", get(health))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route("/api/workouts/stats", get(workout_stats))
        .route(
            "/api/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
}
