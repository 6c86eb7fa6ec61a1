//! Server Module
//!
//! Startup of the workout server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── config.rs - `ServerConfig` from environment variables
//! ├── state.rs  - `AppState` injected into every handler
//! └── init.rs   - Builds the state and the router
//! ```

/// Server configuration
pub mod config;

/// Application state
pub mod state;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::{build_state, create_app};
pub use state::AppState;
