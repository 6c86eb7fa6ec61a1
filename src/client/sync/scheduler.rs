//! # Sync Scheduler
//!
//! Timing of sync passes for the connectivity monitor.
//!
//! ## Triggers
//!
//! - **Settle**: one pass a fixed delay after the network comes back, so the
//!   link has time to stabilize before requests go out
//! - **Poll**: a low-frequency safety net in case a transition event was missed
//!
//! Several "online" events inside one settle window coalesce into a single
//! pass at the earliest deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Synchronization scheduler
#[derive(Debug)]
pub struct SyncScheduler {
    settle_delay: Duration,
    settle_deadline: Option<Instant>,
    poll: Interval,
}

impl SyncScheduler {
    /// Create a scheduler whose first poll fires one interval from now
    pub fn new(settle_delay: Duration, poll_interval: Duration) -> Self {
        let mut poll = interval_at(Instant::now() + poll_interval, poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            settle_delay,
            settle_deadline: None,
            poll,
        }
    }

    /// Arm the settle timer unless it is already armed
    pub fn schedule_settled(&mut self) {
        if self.settle_deadline.is_none() {
            self.settle_deadline = Some(Instant::now() + self.settle_delay);
        }
    }

    /// Disarm the settle timer
    pub fn cancel_settled(&mut self) {
        self.settle_deadline = None;
    }

    pub fn is_settle_pending(&self) -> bool {
        self.settle_deadline.is_some()
    }

    /// Resolves at the settle deadline; pending forever when unarmed.
    ///
    /// The returned future does not borrow the scheduler, so the caller
    /// disarms the timer with `cancel_settled` once it fires.
    pub fn settled(&self) -> impl Future<Output = ()> + Send + 'static {
        let deadline = self.settle_deadline;
        async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        }
    }

    /// Next poll tick
    pub async fn poll_tick(&mut self) {
        self.poll.tick().await;
    }

    /// Whether a poll tick should start a pass
    pub fn should_poll_sync(online: bool, pending: usize) -> bool {
        online && pending > 0
    }
}
