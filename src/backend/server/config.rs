/**
 * Server Configuration
 *
 * Loaded from environment variables (a `.env` file is read by the binary
 * before this runs):
 *
 * - `SERVER_PORT` - listen port, default 3000
 * - `FITLOG_API_TOKENS` - `token:user_id` pairs separated by commas
 *
 * A server without tokens starts, but every workout route answers 401.
 */
use std::net::SocketAddr;

use crate::shared::ConfigError;

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Raw token table, parsed by `StaticTokenVerifier::parse`
    pub api_tokens: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_tokens: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(port) = lookup("SERVER_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                message: format!("'{}' is not a port number", port),
            })?;
        }
        if let Some(tokens) = lookup("FITLOG_API_TOKENS") {
            config.api_tokens = tokens;
        }
        Ok(config)
    }

    pub fn with_tokens(mut self, tokens: impl Into<String>) -> Self {
        self.api_tokens = tokens.into();
        self
    }

    /// Address to bind: all interfaces on `port`
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("SERVER_PORT", "8080"), ("FITLOG_API_TOKENS", "t:u")]);
        let config = ServerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_tokens, "t:u");
        assert_eq!(config.listen_addr().port(), 8080);
    }

    #[test]
    fn test_defaults_and_bad_port() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());

        let result = ServerConfig::from_lookup(|key| {
            (key == "SERVER_PORT").then(|| "eighty".to_string())
        });
        assert!(result.is_err());
    }
}
