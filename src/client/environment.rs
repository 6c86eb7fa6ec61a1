//! # Environment
//!
//! The host capabilities the sync subsystem depends on, passed in explicitly
//! instead of probed from globals: whether an interactive page is present,
//! the platform network signal, and an optional background-sync registry.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Platform connectivity transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    Online,
    Offline,
}

/// Platform network signal
pub trait NetworkSignal: Send + Sync {
    /// Current best-effort connectivity
    fn is_online(&self) -> bool;
    /// Stream of online/offline transitions
    fn subscribe(&self) -> broadcast::Receiver<NetworkEvent>;
}

/// Network signal driven by the host, which pushes transitions as it sees them
#[derive(Debug)]
pub struct ManualNetworkSignal {
    online: AtomicBool,
    events: broadcast::Sender<NetworkEvent>,
}

impl ManualNetworkSignal {
    pub fn new(online: bool) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            online: AtomicBool::new(online),
            events,
        }
    }

    /// Record a transition and notify subscribers.
    ///
    /// Setting the current value again still emits an event, matching
    /// platforms that fire redundant `online` events.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        let event = if online {
            NetworkEvent::Online
        } else {
            NetworkEvent::Offline
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Change the reported value without emitting a transition
    pub fn set_online_silently(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ManualNetworkSignal {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkSignal for ManualNetworkSignal {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }
}

/// Background-sync registration failure
#[derive(Debug, Error)]
#[error("background sync registration failed: {0}")]
pub struct RegistrationError(pub String);

/// Host facility that wakes the background worker for a tag once
/// connectivity returns
#[async_trait]
pub trait BackgroundSyncRegistry: Send + Sync {
    async fn register(&self, tag: &str) -> Result<(), RegistrationError>;
}

/// Capabilities of the running host
#[derive(Clone)]
pub struct Environment {
    /// An interactive page is present; without it nothing initializes
    pub interactive: bool,
    pub network: Arc<dyn NetworkSignal>,
    pub background: Option<Arc<dyn BackgroundSyncRegistry>>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("interactive", &self.interactive)
            .field("online", &self.network.is_online())
            .field("background", &self.background.is_some())
            .finish()
    }
}

impl Environment {
    /// Interactive environment without a background-sync registry
    pub fn interactive(network: Arc<dyn NetworkSignal>) -> Self {
        Self {
            interactive: true,
            network,
            background: None,
        }
    }

    /// Non-interactive environment (e.g. server-side rendering); never becomes ready
    pub fn headless(network: Arc<dyn NetworkSignal>) -> Self {
        Self {
            interactive: false,
            network,
            background: None,
        }
    }

    /// Attach a background-sync registry
    pub fn with_background(mut self, registry: Arc<dyn BackgroundSyncRegistry>) -> Self {
        self.background = Some(registry);
        self
    }
}
