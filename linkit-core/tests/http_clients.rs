use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use linkit_core::auth::{AuthApi, AuthErrorCode, AuthFailure, HttpAuthApi};
use linkit_core::availability::REJECTED_MESSAGE;
use linkit_core::types::{SignInParams, SignUpParams};
use linkit_core::{AvailabilityClient, CheckError, CheckPhase, HttpAvailabilityClient, UsernameCheck};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Serves `app` on an ephemeral port and returns its base url.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn check_username_server(status: StatusCode, body: impl IntoResponse + Clone + Send + Sync + 'static) -> String {
    let app = Router::new().route(
        "/api/check-username",
        get(move || {
            let body = body.clone();
            async move { (status, body) }
        }),
    );
    spawn_server(app).await
}

async fn check(base: &str, name: &str) -> Result<linkit_core::types::CheckUsernameResponse, CheckError> {
    let client = HttpAvailabilityClient::new(base).unwrap();
    client.check(name, &CancellationToken::new()).await
}

#[tokio::test]
async fn rejected_check_surfaces_server_message() {
    let body = Json(json!({ "available": false, "message": "Username must be at least 3 characters" }));
    let base = check_username_server(StatusCode::BAD_REQUEST, body).await;

    let res = check(&base, "ab").await.unwrap();
    assert!(!res.available);
    assert_eq!(res.message.as_deref(), Some("Username must be at least 3 characters"));
}

#[tokio::test]
async fn rejected_check_without_message_uses_fallback() {
    let base = check_username_server(StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "available": false }))).await;

    let res = check(&base, "alice").await.unwrap();
    assert!(!res.available);
    assert_eq!(res.message.as_deref(), Some(REJECTED_MESSAGE));
}

#[tokio::test]
async fn html_error_page_is_a_transport_failure() {
    let base = check_username_server(StatusCode::BAD_GATEWAY, Html("<html>502 Bad Gateway</html>")).await;

    let res = check(&base, "alice").await;
    assert!(matches!(res, Err(CheckError::Transport(_))));

    let client = Arc::new(HttpAvailabilityClient::new(&base).unwrap());
    let controller = UsernameCheck::with_debounce(client, Duration::from_millis(10));
    controller.on_change("alice");
    let mut rx = controller.subscribe();
    while rx.borrow_and_update().phase != CheckPhase::CheckFailed {
        rx.changed().await.unwrap();
    }
    assert_eq!(controller.state().is_available, Some(false));
}

#[tokio::test]
async fn available_answer_passes_through() {
    let body = Json(json!({ "available": true, "message": "Username is available" }));
    let base = check_username_server(StatusCode::OK, body).await;

    let res = check(&base, "nova").await.unwrap();
    assert!(res.available);
    assert_eq!(res.message.as_deref(), Some("Username is available"));
}

fn sign_up_params() -> SignUpParams {
    SignUpParams {
        email: "ada@example.com".into(),
        password: "Secret123".into(),
        username: "ada".into(),
        display_name: None,
    }
}

#[tokio::test]
async fn auth_error_body_is_decoded() {
    let app = Router::new()
        .route(
            "/api/auth/signup",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "code": "username_taken", "message": "Username is already taken" })),
                )
            }),
        )
        .route("/api/auth/session", get(|| async { Json(serde_json::Value::Null) }));
    let api = HttpAuthApi::new(&spawn_server(app).await).unwrap();

    let err = api.sign_up(&sign_up_params()).await.unwrap_err();
    assert_eq!(err, AuthFailure::new(AuthErrorCode::UsernameTaken, "Username is already taken"));

    assert!(api.get_session("stale").await.unwrap().is_none());
}

#[tokio::test]
async fn auth_html_error_page_is_a_network_failure() {
    let app = Router::new().route(
        "/api/auth/signin",
        post(|| async { (StatusCode::BAD_GATEWAY, Html("<html>502 Bad Gateway</html>")) }),
    );
    let api = HttpAuthApi::new(&spawn_server(app).await).unwrap();

    let params = SignInParams { email: "ada@example.com".into(), password: "Secret123".into() };
    let err = api.sign_in(&params).await.unwrap_err();
    assert_eq!(err, AuthFailure::network());
}
