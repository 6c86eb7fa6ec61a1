//! # Background Wake Registration
//!
//! Page-side half of the background wake source. When an offline submission
//! makes the queue non-empty, the page asks the host to wake the background
//! worker once connectivity returns, even if the page is closed by then.
//!
//! Registration is best effort: a missing registry or a failed registration
//! is logged and the connectivity monitor remains the fallback trigger.

use std::sync::Arc;

use crate::client::environment::BackgroundSyncRegistry;

/// One-shot tag the worker listens for
pub const SYNC_TAG: &str = "sync-workouts";

#[derive(Clone, Default)]
pub struct BackgroundWake {
    registry: Option<Arc<dyn BackgroundSyncRegistry>>,
}

impl std::fmt::Debug for BackgroundWake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWake")
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

impl BackgroundWake {
    pub fn new(registry: Option<Arc<dyn BackgroundSyncRegistry>>) -> Self {
        Self { registry }
    }

    /// Called after an enqueue; registers only on the empty to non-empty edge.
    ///
    /// Returns whether a registration was made.
    pub async fn on_enqueued(&self, queue_was_empty: bool) -> bool {
        if !queue_was_empty {
            return false;
        }
        let Some(registry) = &self.registry else {
            tracing::debug!("Background sync unavailable, relying on connectivity monitor");
            return false;
        };

        match registry.register(SYNC_TAG).await {
            Ok(()) => {
                tracing::info!("Registered background sync '{}'", SYNC_TAG);
                true
            }
            Err(e) => {
                tracing::warn!("Background sync registration failed: {}", e);
                false
            }
        }
    }
}
