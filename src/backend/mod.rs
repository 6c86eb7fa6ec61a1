//! Backend Module
//!
//! Workout REST server, compiled with the `ssr` feature.
//!
//! # Module Structure
//!
//! - **`server`** - configuration, `AppState`, startup
//! - **`routes`** - router assembly
//! - **`workouts`** - document store and handlers
//! - **`auth`** - token verification
//! - **`middleware`** - `AuthUser` extractor
//! - **`error`** - `BackendError` and its JSON response
//!
//! # Usage
//!
//! ```rust,no_run
//! use fitlog::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let addr = config.listen_addr();
//! let app = create_app(config)?;
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod workouts;

pub use error::BackendError;
