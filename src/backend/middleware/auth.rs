/**
 * Authentication Extractor
 *
 * Resolves the caller of a protected route. The session token is read from
 * the `token` cookie first, then from `Authorization: Bearer <token>`, and
 * verified with the `TokenVerifier` held in `AppState`.
 *
 * Handlers take `AuthUser` as a parameter; requests without a valid token
 * are rejected with 401 before the handler runs.
 */

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Session token from the `token` cookie or the bearer header
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::warn!("Missing session token");
                BackendError::Unauthorized
            })?;

        let user_id = state.verifier.verify(&token).ok_or_else(|| {
            tracing::warn!("Invalid session token");
            BackendError::Unauthorized
        })?;

        Ok(AuthUser { user_id })
    }
}
