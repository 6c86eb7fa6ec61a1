//! Middleware Module
//!
//! Request processing shared by the workout routes.
//!
//! - **`auth`** - `AuthUser` extractor resolving the session token

pub mod auth;

pub use auth::{extract_token, AuthUser};
