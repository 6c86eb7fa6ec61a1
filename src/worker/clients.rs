/**
 * Worker → Client Broadcasting
 *
 * Every open client (page) subscribes to the hub and receives a copy of
 * each message the worker posts, using `tokio::sync::broadcast`.
 */
use tokio::sync::broadcast;

use crate::shared::ClientMessage;

/// Channel capacity; a lagging client only ever misses sync requests
const CLIENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ClientHub {
    tx: broadcast::Sender<ClientMessage>,
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Register a client
    pub fn subscribe(&self) -> broadcast::Receiver<ClientMessage> {
        self.tx.subscribe()
    }

    /// Number of open clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Post a message to every open client.
    ///
    /// Returns the number of clients reached (0 when none is open).
    pub fn post_all(&self, message: ClientMessage) -> usize {
        match self.tx.send(message) {
            Ok(count) => {
                tracing::info!("[Worker] {:?} posted to {} clients", message, count);
                count
            }
            Err(_) => {
                tracing::debug!("[Worker] No open clients for {:?}", message);
                0
            }
        }
    }
}
