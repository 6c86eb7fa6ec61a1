/**
 * Application State
 *
 * `AppState` is built once at startup and cloned into every handler through
 * axum's `State` extractor. It holds the workout store, the token verifier
 * and the server configuration, all behind `Arc`.
 */
use std::sync::Arc;

use crate::backend::auth::TokenVerifier;
use crate::backend::server::config::ServerConfig;
use crate::backend::workouts::store::WorkoutStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WorkoutStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub config: Arc<ServerConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        store: Arc<dyn WorkoutStore>,
        verifier: Arc<dyn TokenVerifier>,
        config: ServerConfig,
    ) -> Self {
        Self {
            store,
            verifier,
            config: Arc::new(config),
        }
    }
}
