mod auth;
mod error;
mod extract;
mod guard;
mod profile;
mod username;

pub use error::ApiError;
pub use extract::{SESSION_COOKIE, session_token};

use crate::Registry;
use crate::error::{AppResult, InfraError};
use axum::{
    Router,
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
};
use linkit_core::auth::AuthErrorCode;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub fn router(registry: Arc<Registry>) -> Router {
    let cors = if registry.config.cors_allow_any {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/api/check-username", get(username::check_username))
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/exchange", post(auth::exchange))
        .route("/api/profiles/me", patch(profile::update_me))
        .route("/api/profiles/by-username/{username}", get(profile::get_by_username))
        .route("/api/profiles/{id}", get(profile::get_by_id))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(registry.clone(), guard::route_guard))
        .layer(cors)
        .with_state(registry)
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, AuthErrorCode::NotFound, "Not found")
}

/// Run the HTTP server
pub async fn serve(addr: std::net::SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let app = router(registry);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    tracing::info!(%addr, "linkit http listening");
    axum::serve(listener, app).await.map_err(InfraError::from)?;
    Ok(())
}
