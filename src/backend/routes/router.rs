/**
 * Router Creation
 *
 * Assembles the API routes, wraps them in a `TraceLayer` so every request
 * is logged through `tracing`, and answers unknown paths with a JSON 404.
 */
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

async fn not_found() -> BackendError {
    BackendError::NotFound { resource: "Route" }
}

/// Create the application router over `app_state`
pub fn create_router(app_state: AppState) -> Router<()> {
    configure_api_routes(Router::new())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
