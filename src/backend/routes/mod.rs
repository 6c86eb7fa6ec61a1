//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Main router creation, tracing and fallback
//! └── api_routes.rs - /api endpoints
//! ```
//!
//! # Routes
//!
//! - `GET /api/health` - liveness, no authentication
//! - `GET|POST /api/workouts`
//! - `GET /api/workouts/stats`
//! - `GET|PUT|DELETE /api/workouts/{id}`
//!
//! Unknown paths answer 404 in the JSON error shape.

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
