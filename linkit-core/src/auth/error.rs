use crate::types::ErrorBody;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    InvalidCredentials,
    EmailNotConfirmed,
    UserNotFound,
    WeakPassword,
    EmailTaken,
    UsernameTaken,
    RateLimitExceeded,
    Validation,
    Unauthorized,
    InvalidCode,
    NotFound,
    Unknown,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::InvalidCredentials => "invalid_credentials",
            AuthErrorCode::EmailNotConfirmed => "email_not_confirmed",
            AuthErrorCode::UserNotFound => "user_not_found",
            AuthErrorCode::WeakPassword => "weak_password",
            AuthErrorCode::EmailTaken => "email_taken",
            AuthErrorCode::UsernameTaken => "username_taken",
            AuthErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            AuthErrorCode::Validation => "validation",
            AuthErrorCode::Unauthorized => "unauthorized",
            AuthErrorCode::InvalidCode => "invalid_code",
            AuthErrorCode::NotFound => "not_found",
            AuthErrorCode::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "invalid_credentials" => AuthErrorCode::InvalidCredentials,
            "email_not_confirmed" => AuthErrorCode::EmailNotConfirmed,
            "user_not_found" => AuthErrorCode::UserNotFound,
            "weak_password" => AuthErrorCode::WeakPassword,
            "email_taken" => AuthErrorCode::EmailTaken,
            "username_taken" => AuthErrorCode::UsernameTaken,
            "rate_limit_exceeded" => AuthErrorCode::RateLimitExceeded,
            "validation" => AuthErrorCode::Validation,
            "unauthorized" => AuthErrorCode::Unauthorized,
            "invalid_code" => AuthErrorCode::InvalidCode,
            "not_found" => AuthErrorCode::NotFound,
            _ => AuthErrorCode::Unknown,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the server. Please try again.";

/// User presentable auth error: a stable code plus the message for the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthFailure {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Unknown, message)
    }

    /// The server could not be reached or answered with something unreadable.
    pub fn network() -> Self {
        Self::unknown(NETWORK_ERROR_MESSAGE)
    }
}

impl From<ErrorBody> for AuthFailure {
    fn from(body: ErrorBody) -> Self {
        Self { code: AuthErrorCode::parse(&body.code), message: body.message }
    }
}

impl From<&AuthFailure> for ErrorBody {
    fn from(f: &AuthFailure) -> Self {
        Self { code: f.code.as_str().to_string(), message: f.message.clone() }
    }
}

/// Maps a raw backend message onto a friendly failure. Transport errors never
/// come through here: their text carries request URLs.
/// Rules are checked in order; the loose ones ("password", "email") come last.
pub fn map_auth_error(message: &str) -> AuthFailure {
    let lower = message.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("invalid login credentials") || has("invalid_credentials") {
        return AuthFailure::new(AuthErrorCode::InvalidCredentials, "Invalid email or password");
    }
    if has("email not confirmed") {
        return AuthFailure::new(AuthErrorCode::EmailNotConfirmed, "Please verify your email before logging in");
    }
    if has("user not found") {
        return AuthFailure::new(AuthErrorCode::UserNotFound, "No account found with this email");
    }
    if has("weak password") || has("password") {
        return AuthFailure::new(AuthErrorCode::WeakPassword, "Password does not meet requirements");
    }
    if has("already registered") || has("email") {
        return AuthFailure::new(AuthErrorCode::EmailTaken, "An account with this email already exists");
    }
    if has("rate limit") || has("too many") {
        return AuthFailure::new(AuthErrorCode::RateLimitExceeded, "Too many attempts. Please try again later.");
    }

    if message.is_empty() {
        AuthFailure::unknown("An unexpected error occurred")
    } else {
        AuthFailure::unknown(message)
    }
}
