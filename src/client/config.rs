use std::time::Duration;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Client configuration wrapper.
///
/// Holds the shared `AppConfig` plus the session token, which changes at
/// runtime (login/logout) while the rest stays fixed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    app: AppConfig,
    token: Option<String>,
}

impl Config {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already validated `AppConfig`
    pub fn from_app(app: AppConfig) -> Self {
        let token = app.api_token.clone();
        Self { app, token }
    }

    /// Build from a builder
    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self::from_app(builder.build()?))
    }

    /// Defaults overridden by `FITLOG_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from_app(AppConfig::from_env()?))
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Clear the token (logout)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Full URL for an API path, e.g. `api_url("/api/workouts")`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url(), path)
    }

    /// URL of the workout create/list endpoint
    pub fn workouts_url(&self) -> String {
        self.api_url(&self.app.workouts_path())
    }

    /// Server base URL without trailing slash
    pub fn server_url(&self) -> &str {
        self.app.server_url.trim_end_matches('/')
    }

    pub fn settle_delay(&self) -> Duration {
        self.app.settle_delay()
    }

    pub fn poll_interval(&self) -> Duration {
        self.app.poll_interval()
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout()
    }

    /// Underlying shared configuration
    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}
