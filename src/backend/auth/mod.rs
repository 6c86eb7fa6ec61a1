//! Authentication Module
//!
//! Token verification for the workout endpoints. Issuing and validating
//! real session tokens happens outside this server; here a token is only
//! resolved to the id of the user it belongs to.
//!
//! # Architecture
//!
//! - **`TokenVerifier`** - the seam: token in, user id out
//! - **`StaticTokenVerifier`** - fixed token table, loaded from
//!   `FITLOG_API_TOKENS` (`token:user_id` pairs separated by commas)
//!
//! The request side (cookie / `Authorization` header extraction) lives in
//! `backend::middleware::auth`.

use std::collections::HashMap;

use crate::shared::ConfigError;

/// Resolves a session token to a user id
pub trait TokenVerifier: Send + Sync {
    /// `None` when the token is unknown or invalid
    fn verify(&self, token: &str) -> Option<String>;
}

/// Verifier over a fixed token table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token for a user (builder style)
    pub fn with_token(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), user_id.into());
        self
    }

    /// Parse `token:user_id,token2:user_id2`; blank entries are skipped
    pub fn parse(table: &str) -> Result<Self, ConfigError> {
        let mut verifier = Self::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, user_id) = entry
                .split_once(':')
                .map(|(t, u)| (t.trim(), u.trim()))
                .filter(|(t, u)| !t.is_empty() && !u.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "FITLOG_API_TOKENS",
                    message: format!("expected token:user_id, got '{}'", entry),
                })?;
            verifier.tokens.insert(token.to_string(), user_id.to_string());
        }
        Ok(verifier)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}
