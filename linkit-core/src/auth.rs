use crate::types::{
    Profile, ProfileUpdate, SessionData, SignInParams, SignInResult, SignUpParams, SignUpResult,
};
use async_trait::async_trait;
use uuid::Uuid;

mod error;
mod http;
mod store;

pub use error::{AuthErrorCode, AuthFailure, NETWORK_ERROR_MESSAGE, map_auth_error};
pub use http::HttpAuthApi;
pub use store::{AuthState, AuthStore};

pub type AuthResult<T> = Result<T, AuthFailure>;

/// Auth and profile operations of the linkit backend.
///
/// Calls that need a signed in user take the access token explicitly; the
/// [`AuthStore`] keeps track of which token is current.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(&self, params: &SignUpParams) -> AuthResult<SignUpResult>;
    async fn sign_in(&self, params: &SignInParams) -> AuthResult<SignInResult>;
    async fn sign_out(&self, access_token: &str) -> AuthResult<()>;
    /// `None` when the token is unknown or expired.
    async fn get_session(&self, access_token: &str) -> AuthResult<Option<SessionData>>;
    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()>;
    /// Trades an emailed auth code for a session.
    async fn exchange_code(&self, code: &str) -> AuthResult<SessionData>;

    async fn get_profile_by_id(&self, id: Uuid) -> AuthResult<Option<Profile>>;
    async fn get_profile_by_username(&self, username: &str) -> AuthResult<Option<Profile>>;
    async fn update_profile(&self, access_token: &str, update: &ProfileUpdate) -> AuthResult<Profile>;
}
