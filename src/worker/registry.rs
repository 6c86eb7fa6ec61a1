//! Background-sync tag registry held by the worker.
//!
//! Pages register one-shot tags; when connectivity returns the worker drains
//! the registry and fires a sync event per tag. Registering a tag that is
//! already pending is a no-op.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::client::environment::{BackgroundSyncRegistry, RegistrationError};

#[derive(Debug, Default)]
pub struct SyncRegistry {
    tags: Mutex<BTreeSet<String>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_tags(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Remove and return every pending tag
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.tags.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BackgroundSyncRegistry for SyncRegistry {
    async fn register(&self, tag: &str) -> Result<(), RegistrationError> {
        if tag.is_empty() {
            return Err(RegistrationError("empty tag".to_string()));
        }
        if self.lock().insert(tag.to_string()) {
            tracing::debug!("[Worker] Background sync '{}' registered", tag);
        }
        Ok(())
    }
}
