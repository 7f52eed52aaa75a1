use super::{AuthApi, AuthErrorCode, AuthFailure, AuthResult, map_auth_error};
use crate::types::{
    ErrorBody, Profile, ProfileUpdate, ResetPasswordParams, SessionData, SignInParams, SignInResult, SignUpParams,
    SignUpResult,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// [`AuthApi`] over the linkit server's JSON endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    http: Client,
    base: Url,
}

impl HttpAuthApi {
    pub fn new(base_url: &str) -> AuthResult<Self> {
        let base = Url::parse(base_url).map_err(|e| AuthFailure::unknown(format!("invalid base url: {e}")))?;
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AuthFailure::unknown(format!("unable to build http client: {e}")))?;
        Ok(Self { http, base })
    }

    fn url(&self, segments: &[&str]) -> AuthResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| AuthFailure::unknown("base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder) -> AuthResult<Response> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "auth request failed");
            AuthFailure::network()
        })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        match resp.json::<ErrorBody>().await {
            Ok(body) => Err(body.into()),
            Err(_) => Err(status_failure(status)),
        }
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> AuthResult<T> {
        self.send(req).await?.json::<T>().await.map_err(|e| {
            tracing::warn!(error = %e, "undecodable auth response");
            AuthFailure::network()
        })
    }
}

/// Failure for an error status whose body is not an [`ErrorBody`].
fn status_failure(status: StatusCode) -> AuthFailure {
    match status {
        StatusCode::TOO_MANY_REQUESTS => map_auth_error("too many requests"),
        StatusCode::UNAUTHORIZED => AuthFailure::new(AuthErrorCode::Unauthorized, "Please sign in to continue"),
        _ => {
            tracing::warn!(%status, "auth request rejected without an error body");
            AuthFailure::network()
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn sign_up(&self, params: &SignUpParams) -> AuthResult<SignUpResult> {
        let url = self.url(&["api", "auth", "signup"])?;
        self.json(self.http.post(url).json(params)).await
    }

    async fn sign_in(&self, params: &SignInParams) -> AuthResult<SignInResult> {
        let url = self.url(&["api", "auth", "signin"])?;
        self.json(self.http.post(url).json(params)).await
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let url = self.url(&["api", "auth", "signout"])?;
        self.send(self.http.post(url).bearer_auth(access_token)).await?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> AuthResult<Option<SessionData>> {
        let url = self.url(&["api", "auth", "session"])?;
        self.json(self.http.get(url).bearer_auth(access_token)).await
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()> {
        let url = self.url(&["api", "auth", "reset-password"])?;
        let params = ResetPasswordParams { email: email.to_string(), redirect_to: redirect_to.to_string() };
        self.send(self.http.post(url).json(&params)).await?;
        Ok(())
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<SessionData> {
        let url = self.url(&["api", "auth", "exchange"])?;
        self.json(self.http.post(url).json(&serde_json::json!({ "code": code }))).await
    }

    async fn get_profile_by_id(&self, id: Uuid) -> AuthResult<Option<Profile>> {
        let id = id.to_string();
        let url = self.url(&["api", "profiles", &id])?;
        self.json(self.http.get(url)).await
    }

    async fn get_profile_by_username(&self, username: &str) -> AuthResult<Option<Profile>> {
        let url = self.url(&["api", "profiles", "by-username", username])?;
        self.json(self.http.get(url)).await
    }

    async fn update_profile(&self, access_token: &str, update: &ProfileUpdate) -> AuthResult<Profile> {
        let url = self.url(&["api", "profiles", "me"])?;
        self.json(self.http.patch(url).bearer_auth(access_token).json(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_joined_segment_wise() {
        let api = HttpAuthApi::new("http://localhost:4001/").unwrap();
        assert_eq!(
            api.url(&["api", "auth", "signin"]).unwrap().as_str(),
            "http://localhost:4001/api/auth/signin"
        );
        assert_eq!(
            api.url(&["api", "profiles", "by-username", "a b"]).unwrap().as_str(),
            "http://localhost:4001/api/profiles/by-username/a%20b"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(HttpAuthApi::new("not a url").is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() {
        // The request path contains "password"; it must not leak into the mapping.
        let api = HttpAuthApi::new("http://127.0.0.1:9").unwrap();
        let err = api
            .reset_password_for_email("ada@example.com", "/reset-password")
            .await
            .unwrap_err();
        assert_eq!(err.code, AuthErrorCode::Unknown);
        assert_eq!(err.message, crate::auth::NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn bare_error_statuses() {
        assert_eq!(status_failure(StatusCode::TOO_MANY_REQUESTS).code, AuthErrorCode::RateLimitExceeded);
        assert_eq!(status_failure(StatusCode::UNAUTHORIZED).code, AuthErrorCode::Unauthorized);
        assert_eq!(status_failure(StatusCode::BAD_GATEWAY), AuthFailure::network());
    }
}
