use crate::Registry;
use crate::error::DomainError;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use linkit_core::types::CheckUsernameResponse;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    username: Option<String>,
}

/// `GET /api/check-username?username=<raw>`
pub async fn check_username(
    State(registry): State<Arc<Registry>>,
    Query(q): Query<CheckQuery>,
) -> (StatusCode, Json<CheckUsernameResponse>) {
    let Some(username) = q.username.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, Json(CheckUsernameResponse::unavailable("Username is required")));
    };

    match registry.services.username.is_available(&username).await {
        Ok(true) => (StatusCode::OK, Json(CheckUsernameResponse::available("Username is available"))),
        Ok(false) => (StatusCode::OK, Json(CheckUsernameResponse::unavailable("Username is already taken"))),
        Err(DomainError::Validation { message, .. }) => {
            (StatusCode::BAD_REQUEST, Json(CheckUsernameResponse::unavailable(message)))
        }
        Err(e) => {
            tracing::error!(error = %e, username = %username, "username availability lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CheckUsernameResponse::unavailable("Unable to check username availability")),
            )
        }
    }
}
