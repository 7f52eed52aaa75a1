use super::error::ApiError;
use crate::Registry;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use linkit_core::types::SessionData;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "linkit_session";

/// Session token from `Authorization: Bearer` or the session cookie, in that order.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn clear_session_cookie() -> String {
    session_cookie("", 0)
}

/// The presented token, if any, whether or not it is still valid.
pub struct SessionToken(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(session_token(&parts.headers)))
    }
}

/// A valid session; rejects with 401 otherwise.
pub struct CurrentSession {
    pub data: SessionData,
}

impl FromRequestParts<Arc<Registry>> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, registry: &Arc<Registry>) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let data = registry
            .services
            .auth
            .session(&token)
            .await?
            .ok_or_else(ApiError::unauthorized)?;

        Ok(CurrentSession { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_static("theme=dark; linkit_session=fromcookie"));
        assert_eq!(session_token(&h).as_deref(), Some("fromcookie"));

        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer frombearer"));
        assert_eq!(session_token(&h).as_deref(), Some("frombearer"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut h = HeaderMap::new();
        h.insert(COOKIE, HeaderValue::from_static("linkit_session="));
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(session_token(&h), None);
    }

    #[test]
    fn cookie_format() {
        assert_eq!(
            session_cookie("abc", 60),
            "linkit_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
        assert!(clear_session_cookie().ends_with("Max-Age=0"));
    }
}
