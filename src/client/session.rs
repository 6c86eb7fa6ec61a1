//! Cached User Session
//!
//! Keeps the last signed-in user in local storage so the app can show who
//! is logged in while offline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::storage::{LocalStorage, StorageError};

/// The signed-in user as returned by the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Storage slot holding the current user
pub struct UserCache {
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl UserCache {
    pub fn new(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Remember the user after a successful login
    pub async fn store(&self, user: &CachedUser) -> Result<(), StorageError> {
        let json = serde_json::to_string(user)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.storage.set_item(&self.key, &json).await
    }

    /// The cached user, if any. Unreadable entries count as absent.
    pub async fn current(&self) -> Option<CachedUser> {
        let json = match self.storage.get_item(&self.key).await {
            Ok(json) => json?,
            Err(e) => {
                tracing::warn!("Failed to read cached user: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached user: {}", e);
                None
            }
        }
    }

    /// Forget the user (logout)
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(&self.key).await
    }
}
