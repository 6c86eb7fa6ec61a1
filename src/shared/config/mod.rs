//! Application configuration module
//!
//! Provides the configuration shared by the offline client and the background
//! worker: server location, sync timings, storage slot names and the worker's
//! cache version and allow-list.
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! TOML file, and `FITLOG_*` environment variables.
//!
//! ```toml
//! server_url = "https://fit.example.com"
//! settle_delay_ms = 1500
//! poll_interval_secs = 45
//!
//! [retry]
//! dead_letter_after = 5
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
/// Path prefix of every REST endpoint
pub const DEFAULT_API_NAMESPACE: &str = "/api";
/// Storage slot holding the pending-workout snapshot
pub const DEFAULT_QUEUE_KEY: &str = "fitlog.pendingWorkouts";
/// Storage slot holding dead-lettered workouts
pub const DEFAULT_DEAD_LETTER_KEY: &str = "fitlog.deadLetterWorkouts";
/// Storage slot holding the cached current user
pub const DEFAULT_USER_KEY: &str = "currentUser";

/// Routes the worker pre-caches at install time
pub const DEFAULT_PRECACHE_ROUTES: &[&str] = &[
    "/",
    "/workouts",
    "/workouts/new",
    "/measurements",
    "/nutrition",
    "/journal",
    "/knowledge-hub",
    "/manifest.json",
];

/// Retry behaviour for records the server keeps rejecting
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    /// Move a record to the dead-letter slot after this many 4xx rejections.
    /// `None` retries forever.
    pub dead_letter_after: Option<u32>,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL
    pub server_url: String,
    /// API path prefix; requests under it are never cached by the worker
    pub api_namespace: String,
    /// Bearer token sent with API calls
    pub api_token: Option<String>,
    /// Delay between an "online" transition and the sync pass it triggers
    pub settle_delay_ms: u64,
    /// Interval of the safety-net sync timer
    pub poll_interval_secs: u64,
    /// HTTP request timeout
    pub request_timeout_secs: u64,
    /// Version string of the worker's resource cache
    pub cache_version: String,
    /// Routes fetched into the cache at worker install
    pub precache_routes: Vec<String>,
    /// Storage slot of the queue snapshot
    pub queue_storage_key: String,
    /// Storage slot of the dead-letter snapshot
    pub dead_letter_storage_key: String,
    /// Storage slot of the cached current user
    pub user_storage_key: String,
    /// Retry behaviour
    pub retry: RetrySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_namespace: DEFAULT_API_NAMESPACE.to_string(),
            api_token: None,
            settle_delay_ms: 1_000,
            poll_interval_secs: 30,
            request_timeout_secs: 30,
            cache_version: "v1".to_string(),
            precache_routes: DEFAULT_PRECACHE_ROUTES.iter().map(|r| r.to_string()).collect(),
            queue_storage_key: DEFAULT_QUEUE_KEY.to_string(),
            dead_letter_storage_key: DEFAULT_DEAD_LETTER_KEY.to_string(),
            user_storage_key: DEFAULT_USER_KEY.to_string(),
            retry: RetrySettings::default(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply `FITLOG_*` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults plus `FITLOG_*` environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FITLOG_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(token) = lookup("FITLOG_API_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(value) = lookup("FITLOG_SETTLE_DELAY_MS") {
            self.settle_delay_ms = parse_number("FITLOG_SETTLE_DELAY_MS", &value)?;
        }
        if let Some(value) = lookup("FITLOG_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_number("FITLOG_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(version) = lookup("FITLOG_CACHE_VERSION") {
            self.cache_version = version;
        }
        if let Some(value) = lookup("FITLOG_DEAD_LETTER_AFTER") {
            self.retry.dead_letter_after = Some(parse_number("FITLOG_DEAD_LETTER_AFTER", &value)?);
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if !self.api_namespace.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "api_namespace",
                message: "must start with '/'".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::MissingValue("cache_version"));
        }
        if self.retry.dead_letter_after == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "retry.dead_letter_after",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Settle delay as a `Duration`
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Name of the worker's current resource cache
    pub fn cache_name(&self) -> String {
        format!("fitlog-cache-{}", self.cache_version)
    }

    /// Path of the workout collection endpoint
    pub fn workouts_path(&self) -> String {
        format!("{}/workouts", self.api_namespace.trim_end_matches('/'))
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        message: format!("'{}' is not a valid number", value),
    })
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    /// Set the API bearer token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    /// Set the settle delay
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_secs = interval.as_secs();
        self
    }

    /// Set the cache version
    pub fn cache_version(mut self, version: impl Into<String>) -> Self {
        self.config.cache_version = version.into();
        self
    }

    /// Set the pre-cached routes
    pub fn precache_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.precache_routes = routes.into_iter().map(Into::into).collect();
        self
    }

    /// Dead-letter records after `attempts` rejections
    pub fn dead_letter_after(mut self, attempts: u32) -> Self {
        self.config.retry.dead_letter_after = Some(attempts);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
