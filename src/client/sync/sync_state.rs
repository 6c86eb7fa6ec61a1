//! # Sync Status
//!
//! Point-in-time view of the sync subsystem for a pending/offline indicator.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_ready: bool,
    /// At least one pass is in flight
    pub is_syncing: bool,
    /// Records waiting in the queue
    pub pending: usize,
    /// Records parked in the dead-letter snapshot
    pub dead_lettered: usize,
    /// End of the last executed pass
    pub last_pass_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    /// Anything unsynced is shown to the user, online or not
    pub fn shows_pending_indicator(&self) -> bool {
        self.pending > 0
    }

    /// Short label for a status line
    pub fn label(&self) -> String {
        match (self.is_online, self.pending) {
            (_, 0) if self.is_syncing => "Syncing".to_string(),
            (true, 0) => "All workouts synced".to_string(),
            (false, 0) => "Offline".to_string(),
            (true, n) => format!("{} workout(s) waiting to sync", n),
            (false, n) => format!("Offline, {} workout(s) saved locally", n),
        }
    }
}
