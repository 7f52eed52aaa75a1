use super::error::ApiError;
use super::extract::{SessionToken, clear_session_cookie, session_cookie};
use crate::Registry;
use crate::models::auth_code::CodePurpose;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use linkit_core::routes::{AUTH_CALLBACK_ERROR, home_for, safe_next};
use linkit_core::types::{ResetPasswordParams, SessionData, SignInParams, SignUpParams};
use serde::Deserialize;
use std::sync::Arc;

fn login_cookie(registry: &Registry, token: &str) -> [(axum::http::HeaderName, String); 1] {
    [(SET_COOKIE, session_cookie(token, registry.config.session_ttl_secs))]
}

/// `POST /api/auth/signup`
pub async fn sign_up(
    State(registry): State<Arc<Registry>>,
    Json(params): Json<SignUpParams>,
) -> Result<Response, ApiError> {
    let result = registry.services.auth.sign_up(&params).await?;

    // No session yet while the email still has to be confirmed
    let cookie = result.session.as_ref().map(|s| login_cookie(&registry, &s.access_token));
    Ok(match cookie {
        Some(cookie) => (cookie, Json(result)).into_response(),
        None => Json(result).into_response(),
    })
}

/// `POST /api/auth/signin`
pub async fn sign_in(
    State(registry): State<Arc<Registry>>,
    Json(params): Json<SignInParams>,
) -> Result<Response, ApiError> {
    let result = registry.services.auth.sign_in(&params).await?;
    let cookie = login_cookie(&registry, &result.session.access_token);
    Ok((cookie, Json(result)).into_response())
}

/// `POST /api/auth/signout`
pub async fn sign_out(
    State(registry): State<Arc<Registry>>,
    SessionToken(token): SessionToken,
) -> Result<Response, ApiError> {
    if let Some(token) = token {
        registry.services.auth.sign_out(&token).await?;
    }
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, clear_session_cookie())]).into_response())
}

/// `GET /api/auth/session`
pub async fn session(
    State(registry): State<Arc<Registry>>,
    SessionToken(token): SessionToken,
) -> Result<Json<Option<SessionData>>, ApiError> {
    let Some(token) = token else {
        return Ok(Json(None));
    };
    Ok(Json(registry.services.auth.session(&token).await?))
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(registry): State<Arc<Registry>>,
    Json(params): Json<ResetPasswordParams>,
) -> Result<StatusCode, ApiError> {
    registry
        .services
        .auth
        .reset_password_for_email(&params.email, &params.redirect_to)
        .await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    next: Option<String>,
}

/// `GET /api/auth/callback?code=&next=`: follows a mailed link.
pub async fn callback(State(registry): State<Arc<Registry>>, Query(q): Query<CallbackQuery>) -> Response {
    let Some(code) = q.code.filter(|c| !c.is_empty()) else {
        return Redirect::to(AUTH_CALLBACK_ERROR).into_response();
    };

    let exchange = match registry.services.auth.exchange_code(&code).await {
        Ok(ex) => ex,
        Err(e) => {
            tracing::warn!(error = %e, "auth callback failed");
            return Redirect::to(AUTH_CALLBACK_ERROR).into_response();
        }
    };

    // Recovery links carry the page that sets the new password in `next`
    let username = exchange.data.user.username.as_deref();
    let target = match (exchange.purpose, q.next.as_deref()) {
        (CodePurpose::Recovery, Some(next)) => safe_next(Some(next)).to_string(),
        (_, next) if username.is_none() => safe_next(next).to_string(),
        _ => home_for(username),
    };

    let cookie = login_cookie(&registry, &exchange.data.session.access_token);
    (cookie, Redirect::to(&target)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExchangeParams {
    code: String,
}

/// `POST /api/auth/exchange`: JSON form of the callback.
pub async fn exchange(
    State(registry): State<Arc<Registry>>,
    Json(params): Json<ExchangeParams>,
) -> Result<Response, ApiError> {
    let exchange = registry.services.auth.exchange_code(&params.code).await?;
    let cookie = login_cookie(&registry, &exchange.data.session.access_token);
    Ok((cookie, Json(exchange.data)).into_response())
}
