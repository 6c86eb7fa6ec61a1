//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the offline client, the background worker and the backend. These types
//! are used for serialization over the workout REST API, for the persisted
//! queue snapshot, and for worker/page messaging.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission over HTTP.

/// Workout payload and create-call body
pub mod workout;

/// Worker ↔ page message types
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Workout statistics
pub mod stats;

/// Re-export commonly used types for convenience
pub use workout::{Exercise, ExerciseSet, Workout, WorkoutSubmission};
pub use event::{ClientMessage, WorkerCommand};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError, RetrySettings};
pub use stats::WorkoutStats;
