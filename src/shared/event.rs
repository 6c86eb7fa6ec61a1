/**
 * Worker ↔ Page Messages
 *
 * Typed messages exchanged between the long-lived background worker and
 * the open clients (pages). On the wire they keep the `{ "type": ... }`
 * shape, e.g. `{ "type": "SYNC_WORKOUTS" }`.
 */
use serde::{Deserialize, Serialize};

/// Message posted by the worker to every open client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask the client to run a sync pass over its pending workouts
    SyncWorkouts,
}

/// Message posted by a client to the worker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    /// Activate a waiting worker without waiting for old clients to close
    SkipWaiting,
    /// Relay a sync request to every open client
    SyncWorkouts,
}
