use crate::error::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkit_core::auth::AuthErrorCode;
use linkit_core::types::ErrorBody;

const UNEXPECTED: &str = "An unexpected error occurred";

/// `{code, message}` error body with the matching status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody { code: code.as_str().to_string(), message: message.into() },
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, AuthErrorCode::Unauthorized, "Not signed in")
    }
}

fn status_for(code: AuthErrorCode) -> StatusCode {
    match code {
        AuthErrorCode::InvalidCredentials | AuthErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthErrorCode::EmailNotConfirmed => StatusCode::FORBIDDEN,
        AuthErrorCode::UserNotFound | AuthErrorCode::NotFound => StatusCode::NOT_FOUND,
        AuthErrorCode::WeakPassword | AuthErrorCode::Validation | AuthErrorCode::InvalidCode => StatusCode::BAD_REQUEST,
        AuthErrorCode::EmailTaken | AuthErrorCode::UsernameTaken => StatusCode::CONFLICT,
        AuthErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        AuthErrorCode::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { message, .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, AuthErrorCode::Validation, message)
            }
            DomainError::Auth(f) => ApiError::new(status_for(f.code), f.code, f.message),
            DomainError::NotFound(what) => ApiError::new(StatusCode::NOT_FOUND, AuthErrorCode::NotFound, what),
            DomainError::Unauthorized => ApiError::unauthorized(),
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, AuthErrorCode::Unknown, UNEXPECTED)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
