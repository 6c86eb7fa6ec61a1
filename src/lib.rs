//! fitlog - Main Library
//!
//! Offline-first workout logging. Workouts submitted while the device is
//! offline (or while the server is unreachable) land in a durable local
//! queue and are replayed in order once connectivity returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between client, worker and backend
//!   - Workout payload, statistics, configuration
//!   - Worker ↔ page messages
//!   - Error types
//!
//! - **`client`** - Offline-first client
//!   - Submission façade (`WorkoutSubmitter`)
//!   - Durable pending queue and dead-letter slot
//!   - Sync engine, connectivity monitor, background wake
//!   - HTTP API client and local storage
//!
//! - **`worker`** - Background worker
//!   - Versioned resource cache and offline fallback
//!   - Background-sync relay to open pages
//!
//! - **`backend`** - Workout REST server (only compiled with `ssr` feature)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the axum backend and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use fitlog::client::{Config, Environment, ManualNetworkSignal, SyncClient};
//! use fitlog::shared::Workout;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let network = Arc::new(ManualNetworkSignal::new(true));
//! let mut client = SyncClient::connect(Config::from_env()?, Environment::interactive(network)).await?;
//! client.start(None);
//!
//! let outcome = client
//!     .submitter()
//!     .submit(Workout::new("2024-05-01", "push"))
//!     .await?;
//! println!("stored as {} (offline: {})", outcome.id(), outcome.is_offline());
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Offline-first client
pub mod client;

/// Background worker
pub mod worker;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
