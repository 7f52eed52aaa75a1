use super::{AuthApi, AuthResult};
use crate::routes::{HOME, check_email_path, home_for};
use crate::types::{Profile, SessionData, SignInParams, SignUpParams, User};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// What the UI renders: who is signed in, their profile, and whether a
/// refresh is running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub profile: Option<Profile>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

#[derive(Default)]
struct Cache {
    token: Option<String>,
    session: Option<SessionData>,
    profile: Option<Profile>,
    loading: bool,
}

impl Cache {
    fn snapshot(&self) -> AuthState {
        let user = self.session.as_ref().map(|s| s.user.clone());
        AuthState {
            is_authenticated: user.is_some(),
            is_loading: self.loading,
            user,
            profile: self.profile.clone(),
        }
    }

    fn clear(&mut self) {
        self.token = None;
        self.session = None;
        self.profile = None;
    }
}

/// Client-side auth cache.
///
/// Holds the current session and profile, re-fetches both whenever the auth
/// state changes (sign in/up/out, code exchange) and publishes every change on
/// a watch channel. Mutating calls return the path the UI should navigate to.
pub struct AuthStore {
    api: Arc<dyn AuthApi>,
    cache: Mutex<Cache>,
    /// Serializes refreshes so an older fetch cannot overwrite a newer one.
    refresh_lock: tokio::sync::Mutex<()>,
    tx: watch::Sender<AuthState>,
}

impl AuthStore {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        let (tx, _) = watch::channel(AuthState::default());
        Self {
            api,
            cache: Mutex::new(Cache::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
            tx,
        }
    }

    /// Store that resumes a previously persisted access token. Call
    /// [`AuthStore::refresh`] to load the session behind it.
    pub fn with_token(api: Arc<dyn AuthApi>, token: impl Into<String>) -> Self {
        let store = Self::new(api);
        store.cache.lock().token = Some(token.into());
        store
    }

    pub fn state(&self) -> AuthState {
        self.cache.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.cache.lock().token.clone()
    }

    fn publish(&self, cache: &Cache) {
        self.tx.send_replace(cache.snapshot());
    }

    fn set_loading(&self, loading: bool) {
        let mut cache = self.cache.lock();
        cache.loading = loading;
        self.publish(&cache);
    }

    /// Re-fetches the session and, when signed in, the profile.
    pub async fn refresh(&self) -> AuthResult<AuthState> {
        let _guard = self.refresh_lock.lock().await;
        self.set_loading(true);

        let token = self.access_token();
        let result = match token {
            Some(token) => self.load(&token).await,
            None => {
                let mut cache = self.cache.lock();
                cache.session = None;
                cache.profile = None;
                Ok(())
            }
        };

        self.set_loading(false);
        result.map(|_| self.state())
    }

    async fn load(&self, token: &str) -> AuthResult<()> {
        let session = match self.api.get_session(token).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load session");
                return Err(e);
            }
        };

        let Some(session) = session else {
            tracing::debug!("stored session is no longer valid");
            let mut cache = self.cache.lock();
            if cache.token.as_deref() == Some(token) {
                cache.clear();
            }
            return Ok(());
        };

        let profile = match self.api.get_profile_by_id(session.user.id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %session.user.id, "failed to load profile");
                None
            }
        };

        let mut cache = self.cache.lock();
        // Signed out or switched accounts while the fetch was running.
        if cache.token.as_deref() != Some(token) {
            tracing::debug!("discarding session fetched for a replaced token");
            return Ok(());
        }
        cache.token = Some(session.session.access_token.clone());
        cache.session = Some(session);
        cache.profile = profile;
        Ok(())
    }

    /// Re-fetches the profile of the signed in user; no-op when signed out.
    pub async fn refresh_profile(&self) -> AuthResult<Option<Profile>> {
        let Some(user_id) = self.cache.lock().session.as_ref().map(|s| s.user.id) else {
            return Ok(None);
        };

        let profile = self.api.get_profile_by_id(user_id).await?;

        let mut cache = self.cache.lock();
        if cache.session.as_ref().map(|s| s.user.id) != Some(user_id) {
            return Ok(None);
        }
        cache.profile = profile.clone();
        self.publish(&cache);
        Ok(profile)
    }

    pub async fn sign_in(&self, params: &SignInParams) -> AuthResult<String> {
        let result = self.api.sign_in(params).await?;
        let redirect = home_for(result.user.username.as_deref());

        self.cache.lock().token = Some(result.session.access_token);
        self.refresh().await?;

        Ok(redirect)
    }

    pub async fn sign_up(&self, params: &SignUpParams) -> AuthResult<String> {
        let result = self.api.sign_up(params).await?;

        let Some(session) = result.session else {
            // Account exists but must confirm the email first.
            return Ok(check_email_path(&params.email));
        };

        self.cache.lock().token = Some(session.access_token);
        self.refresh().await?;

        Ok(home_for(Some(&params.username)))
    }

    /// Signs out and drops every cached query, even when the server call fails.
    pub async fn sign_out(&self) -> AuthResult<String> {
        let token = self.access_token();

        let result = match token {
            Some(token) => self.api.sign_out(&token).await,
            None => Ok(()),
        };

        {
            let mut cache = self.cache.lock();
            cache.clear();
            self.publish(&cache);
        }

        result.map(|_| HOME.to_string())
    }

    pub async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AuthResult<()> {
        self.api.reset_password_for_email(email, redirect_to).await
    }

    /// Completes an emailed link and signs the user in.
    pub async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        let data = self.api.exchange_code(code).await?;
        let redirect = home_for(data.user.username.as_deref());

        self.cache.lock().token = Some(data.session.access_token);
        self.refresh().await?;

        Ok(redirect)
    }
}
