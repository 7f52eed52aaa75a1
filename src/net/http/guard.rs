use super::extract::session_token;
use crate::Registry;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use linkit_core::routes::{RouteDecision, guard};
use std::sync::Arc;

/// Page guard. API routes pass straight through.
pub async fn route_guard(State(registry): State<Arc<Registry>>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if path.starts_with("/api/") {
        return next.run(req).await;
    }

    let session = match session_token(req.headers()) {
        Some(token) => match registry.services.auth.session(&token).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed in route guard");
                None
            }
        },
        None => None,
    };

    let signed_in = session.as_ref().map(|s| s.user.username.as_deref());
    match guard(&path, signed_in) {
        RouteDecision::Continue => next.run(req).await,
        RouteDecision::Redirect(to) => {
            tracing::debug!(from = %path, to = %to, "route guard redirect");
            Redirect::temporary(&to).into_response()
        }
    }
}
