//! Backend Error Module
//!
//! Error types of the workout server. Every error converts into a JSON
//! HTTP response, so handlers return `Result<_, BackendError>` directly.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! # Response Format
//!
//! ```json
//! { "error": "Workout not found", "status": 404 }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
