//! # Network Monitor
//!
//! Tracks connectivity and triggers sync passes when it makes sense.
//!
//! ## Features
//!
//! - **Connectivity State**: `is_online` from the platform signal, `is_ready`
//!   once the environment is initialized
//! - **Transition Events**: "online" schedules a pass after the settle delay,
//!   "offline" only flips the flag
//! - **Safety-Net Polling**: re-reads the platform signal on a slow timer and
//!   syncs whenever online with a non-empty queue
//! - **Worker Wake-ups**: a `SYNC_WORKOUTS` message from the background
//!   worker is handled like an "online" transition
//!
//! The listener task lives as long as the `ConnectivityMonitor`; `shutdown()`
//! or dropping it stops the task. Passes are spawned so the listener keeps
//! reacting to transitions while a pass is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::client::environment::{Environment, NetworkEvent, NetworkSignal};
use crate::client::sync::scheduler::SyncScheduler;
use crate::client::sync::SyncEngine;
use crate::shared::ClientMessage;

/// Shared connectivity flags
#[derive(Debug, Default)]
pub struct ConnectivityState {
    online: AtomicBool,
    ready: AtomicBool,
}

impl ConnectivityState {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Returns the previous value
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::SeqCst)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }
}

/// Timing of monitor-triggered passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorTiming {
    pub settle_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for MonitorTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Owner of the connectivity listener task
#[derive(Debug)]
pub struct ConnectivityMonitor {
    task: Option<JoinHandle<()>>,
}

impl ConnectivityMonitor {
    /// Initialize connectivity from the environment and start listening.
    ///
    /// In a non-interactive environment nothing is initialized: the state
    /// never becomes ready and no task is started.
    pub fn start(
        environment: &Environment,
        engine: Arc<SyncEngine>,
        timing: MonitorTiming,
        worker_messages: Option<broadcast::Receiver<ClientMessage>>,
    ) -> Self {
        if !environment.interactive {
            tracing::info!("Non-interactive environment, connectivity monitor not started");
            return Self { task: None };
        }

        let network = Arc::clone(&environment.network);
        let state = Arc::clone(engine.state());
        state.set_online(network.is_online());
        state.mark_ready();
        tracing::info!(
            "Connectivity monitor started (online: {}, settle: {:?}, poll: {:?})",
            state.is_online(),
            timing.settle_delay,
            timing.poll_interval
        );

        let events = network.subscribe();
        let task = tokio::spawn(monitor_loop(network, engine, timing, events, worker_messages));
        Self { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop listening. Passes already in flight run to completion.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Connectivity monitor stopped");
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn monitor_loop(
    network: Arc<dyn NetworkSignal>,
    engine: Arc<SyncEngine>,
    timing: MonitorTiming,
    events: broadcast::Receiver<NetworkEvent>,
    worker_messages: Option<broadcast::Receiver<ClientMessage>>,
) {
    let state = Arc::clone(engine.state());
    let mut scheduler = SyncScheduler::new(timing.settle_delay, timing.poll_interval);
    let mut events = Some(events);
    let mut worker_messages = worker_messages;

    // Records left over from an earlier session go out once the link settles
    if state.is_online() {
        scheduler.schedule_settled();
    }

    loop {
        tokio::select! {
            event = next_message(&mut events) => match event {
                Some(NetworkEvent::Online) => {
                    state.set_online(true);
                    tracing::info!("Network online, syncing in {:?}", timing.settle_delay);
                    scheduler.schedule_settled();
                }
                Some(NetworkEvent::Offline) => {
                    state.set_online(false);
                    scheduler.cancel_settled();
                    tracing::info!("Network offline");
                }
                None => {
                    // Missed transitions; trust the current signal
                    let online = network.is_online();
                    state.set_online(online);
                    if online {
                        scheduler.schedule_settled();
                    }
                }
            },
            message = next_message(&mut worker_messages) => {
                if let Some(ClientMessage::SyncWorkouts) = message {
                    tracing::debug!("Sync requested by background worker");
                    state.set_online(network.is_online());
                    scheduler.schedule_settled();
                }
            },
            _ = scheduler.settled() => {
                scheduler.cancel_settled();
                spawn_pass(&engine);
            },
            _ = scheduler.poll_tick() => {
                let online = network.is_online();
                state.set_online(online);
                let pending = engine.queue().len().await;
                if SyncScheduler::should_poll_sync(online, pending) {
                    tracing::debug!("Poll: {} pending workouts, syncing", pending);
                    spawn_pass(&engine);
                }
            },
        }
    }
}

fn spawn_pass(engine: &Arc<SyncEngine>) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        engine.run_pass().await;
    });
}

/// Next message of an optional channel.
///
/// Stays pending forever once the channel is absent or closed. Returns
/// `None` when messages were skipped because the receiver lagged.
async fn next_message<T: Clone>(receiver: &mut Option<broadcast::Receiver<T>>) -> Option<T> {
    loop {
        let Some(rx) = receiver.as_mut() else {
            return std::future::pending().await;
        };
        match rx.recv().await {
            Ok(message) => return Some(message),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Connectivity monitor lagged, {} messages skipped", skipped);
                return None;
            }
            Err(RecvError::Closed) => {
                *receiver = None;
            }
        }
    }
}
