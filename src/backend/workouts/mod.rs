//! Workouts Module
//!
//! Per-user workout documents and the REST handlers serving them.
//!
//! # Module Structure
//!
//! ```text
//! workouts/
//! ├── mod.rs      - Module exports and documentation
//! ├── store.rs    - Document type, `WorkoutStore` seam, in-memory store
//! └── handlers.rs - Axum handlers for /api/workouts
//! ```
//!
//! Every handler takes an `AuthUser`, so a user only ever sees and edits
//! their own documents. Documents carry their id as an `_id` string.

/// Storage of workout documents
pub mod store;

/// HTTP handlers
pub mod handlers;

pub use handlers::{
    create_workout, delete_workout, get_workout, list_workouts, update_workout, workout_stats,
};
pub use store::{MemoryWorkoutStore, StoredWorkout, WorkoutStore};
