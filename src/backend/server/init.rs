/**
 * Server Initialization
 *
 * 1. Parse the token table from the configuration
 * 2. Create the in-memory workout store
 * 3. Assemble `AppState` and the router
 */
use axum::Router;
use std::sync::Arc;

use crate::backend::auth::StaticTokenVerifier;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;
use crate::backend::workouts::store::MemoryWorkoutStore;
use crate::shared::ConfigError;

/// State with an empty in-memory store and the configured tokens
pub fn build_state(config: ServerConfig) -> Result<AppState, ConfigError> {
    let verifier = StaticTokenVerifier::parse(&config.api_tokens)?;
    if verifier.is_empty() {
        tracing::warn!("FITLOG_API_TOKENS is empty; every workout route will answer 401");
    } else {
        tracing::info!("Loaded {} API tokens", verifier.len());
    }

    Ok(AppState::new(
        Arc::new(MemoryWorkoutStore::new()),
        Arc::new(verifier),
        config,
    ))
}

/// Create the configured application
pub fn create_app(config: ServerConfig) -> Result<Router<()>, ConfigError> {
    tracing::info!("Initializing fitlog backend server");
    let state = build_state(config)?;
    Ok(create_router(state))
}
