use crate::config::Config;
use crate::db::error::DbError;
use crate::db::repo::{AccountRepo, AuthCodeRepo, ProfileRepo, SessionRepo, UsernameRepo};
use crate::error::{AppResult, DomainError};
use crate::models::account::{Account, normalize_email};
use crate::models::auth_code::{AuthCode, CodePurpose};
use crate::models::profile::Profile;
use crate::models::session::Session;
use crate::services::mailer::{MailMessage, Mailer};
use crate::services::profile::USERNAME_TAKEN;
use crate::services::rate_limit::SignInLimiter;
use argon2::Argon2;
use chrono::Utc;
use linkit_core::auth::AuthErrorCode;
use linkit_core::routes::append_query;
use linkit_core::types::{SessionData, SignInParams, SignInResult, SignUpParams, SignUpResult, User};
use linkit_core::validation::{validate_email, validate_password};
use linkit_core::{Username, types};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::Arc;

const EMAIL_TAKEN: &str = "An account with this email already exists";
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_NOT_CONFIRMED: &str = "Please verify your email before logging in";
const RATE_LIMITED: &str = "Too many attempts. Please try again later.";
const INVALID_CODE: &str = "Invalid or expired code";
/// Fallback landing for recovery links.
const RECOVERY_CALLBACK: &str = "/api/auth/callback?next=%2Freset-password";

pub struct AuthService {
    accounts: Arc<dyn AccountRepo>,
    profiles: Arc<dyn ProfileRepo>,
    usernames: Arc<dyn UsernameRepo>,
    sessions: Arc<dyn SessionRepo>,
    codes: Arc<dyn AuthCodeRepo>,
    mailer: Arc<dyn Mailer>,
    limiter: SignInLimiter,
    argon: Argon2<'static>,
    config: Arc<Config>,
}

/// Outcome of following a mailed link.
#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub data: SessionData,
    pub purpose: CodePurpose,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountRepo>,
        profiles: Arc<dyn ProfileRepo>,
        usernames: Arc<dyn UsernameRepo>,
        sessions: Arc<dyn SessionRepo>,
        codes: Arc<dyn AuthCodeRepo>,
        mailer: Arc<dyn Mailer>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            accounts,
            profiles,
            usernames,
            sessions,
            codes,
            mailer,
            limiter: SignInLimiter::default(),
            argon: Argon2::default(),
            config,
        }
    }

    pub async fn sign_up(&self, params: &SignUpParams) -> AppResult<SignUpResult> {
        validate_email(&params.email)?;
        validate_password(&params.password)?;
        let username = Username::parse(&params.username)?;

        if !self.usernames.is_available(&username.normalized()).await? {
            return Err(DomainError::auth(AuthErrorCode::UsernameTaken, USERNAME_TAKEN));
        }
        if self.accounts.get_by_email(&params.email).await?.is_some() {
            return Err(DomainError::auth(AuthErrorCode::EmailTaken, EMAIL_TAKEN));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(params.password.as_bytes(), &salt)
            .map_err(DomainError::Password)?
            .to_string();

        let confirm = self.config.require_email_confirmation;
        let account = Account::new(&params.email, hash, !confirm);
        let profile = Profile::new(account.id, username.as_str(), params.display_name.clone());

        match self.accounts.insert_with_profile(&account, &profile).await {
            Ok(()) => {}
            Err(DbError::UniqueViolation(constraint)) if constraint.contains("username") => {
                return Err(DomainError::auth(AuthErrorCode::UsernameTaken, USERNAME_TAKEN));
            }
            Err(DbError::UniqueViolation(_)) => {
                return Err(DomainError::auth(AuthErrorCode::EmailTaken, EMAIL_TAKEN));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(account_id = %account.id, username = %profile.username, confirm, "account created");

        let user = account.to_user(Some(profile.username.clone()));
        if confirm {
            let code = self.issue_code(&account, CodePurpose::Signup).await?;
            let callback = format!("{}/api/auth/callback", self.config.site_url);
            self.mailer
                .send(MailMessage {
                    to: account.email.clone(),
                    subject: "Confirm your linkit account".into(),
                    link: append_query(&callback, &[("code", &code.code)]),
                })
                .await?;

            return Ok(SignUpResult { user, session: None });
        }

        let session = self.start_session(&account, user.clone()).await?;
        Ok(SignUpResult { user, session: Some(session) })
    }

    pub async fn sign_in(&self, params: &SignInParams) -> AppResult<SignInResult> {
        let key = normalize_email(&params.email);
        if self.limiter.is_blocked(&key) {
            tracing::warn!(email = %key, "sign in rate limited");
            return Err(DomainError::auth(AuthErrorCode::RateLimitExceeded, RATE_LIMITED));
        }

        let Some(account) = self.accounts.get_by_email(&key).await? else {
            tracing::warn!(email = %key, "sign in failed: unknown email");
            self.limiter.record_failure(&key);
            return Err(DomainError::auth(AuthErrorCode::InvalidCredentials, INVALID_CREDENTIALS));
        };

        let parsed = PasswordHash::new(&account.password_hash).map_err(DomainError::Password)?;
        if self.argon.verify_password(params.password.as_bytes(), &parsed).is_err() {
            tracing::warn!(email = %key, "sign in failed: invalid password");
            self.limiter.record_failure(&key);
            return Err(DomainError::auth(AuthErrorCode::InvalidCredentials, INVALID_CREDENTIALS));
        }

        if !account.is_confirmed() {
            return Err(DomainError::auth(AuthErrorCode::EmailNotConfirmed, EMAIL_NOT_CONFIRMED));
        }

        self.limiter.reset(&key);
        self.accounts.update_last_login(account.id).await?;

        let user = self.user_for(&account).await?;
        let session = self.start_session(&account, user.clone()).await?;
        Ok(SignInResult { user, session })
    }

    /// Idempotent: unknown tokens are ignored.
    pub async fn sign_out(&self, token: &str) -> AppResult<()> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Resolves a session token. Unknown and expired tokens yield `None`.
    pub async fn session(&self, token: &str) -> AppResult<Option<SessionData>> {
        let Some(session) = self.sessions.get(token).await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            self.sessions.delete(token).await?;
            return Ok(None);
        }
        let Some(account) = self.accounts.get_by_id(session.account_id).await? else {
            return Ok(None);
        };

        let user = self.user_for(&account).await?;
        Ok(Some(session_data(&session, user)))
    }

    /// Sends a recovery link when the account exists. The result never tells
    /// whether it does.
    pub async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> AppResult<()> {
        validate_email(email)?;
        let redirect_to = self.recovery_target(redirect_to);

        let Some(account) = self.accounts.get_by_email(email).await? else {
            tracing::debug!(email = %normalize_email(email), "password reset for unknown email");
            return Ok(());
        };

        let code = self.issue_code(&account, CodePurpose::Recovery).await?;
        self.mailer
            .send(MailMessage {
                to: account.email.clone(),
                subject: "Reset your linkit password".into(),
                link: append_query(&redirect_to, &[("code", &code.code)]),
            })
            .await?;

        Ok(())
    }

    /// Trades a mailed code for a fresh session. Sign-up codes confirm the email.
    pub async fn exchange_code(&self, code: &str) -> AppResult<CodeExchange> {
        let invalid = || DomainError::auth(AuthErrorCode::InvalidCode, INVALID_CODE);

        let code = self.codes.consume(code.trim()).await?.ok_or_else(invalid)?;
        let account = self.accounts.get_by_id(code.account_id).await?.ok_or_else(invalid)?;

        if code.purpose == CodePurpose::Signup {
            self.accounts.confirm_email(account.id).await?;
        }
        self.accounts.update_last_login(account.id).await?;

        // Reload so the confirmation shows up on the user
        let account = self.accounts.get_by_id(account.id).await?.unwrap_or(account);
        let user = self.user_for(&account).await?;
        let session = self.start_session(&account, user.clone()).await?;
        tracing::info!(account_id = %account.id, purpose = %code.purpose, "auth code exchanged");

        Ok(CodeExchange { data: SessionData { user, session }, purpose: code.purpose })
    }

    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        Ok(self.sessions.delete_expired().await?)
    }

    async fn user_for(&self, account: &Account) -> AppResult<User> {
        let username = self.profiles.get_by_id(account.id).await?.map(|p| p.username);
        Ok(account.to_user(username))
    }

    async fn start_session(&self, account: &Account, user: User) -> AppResult<types::Session> {
        let session = Session::issue(account.id, self.config.session_ttl());
        self.sessions.insert(&session).await?;
        Ok(session_data(&session, user).session)
    }

    async fn issue_code(&self, account: &Account, purpose: CodePurpose) -> AppResult<AuthCode> {
        let code = AuthCode::issue(account.id, purpose);
        self.codes.insert(&code).await?;
        Ok(code)
    }

    /// Recovery links may only point back at this site; anything else falls
    /// back to the site's own callback.
    fn recovery_target(&self, redirect_to: &str) -> String {
        let site = &self.config.site_url;
        if redirect_to.starts_with('/') && !redirect_to.starts_with("//") {
            return format!("{site}{redirect_to}");
        }
        if redirect_to == site.as_str() || redirect_to.starts_with(&format!("{site}/")) {
            return redirect_to.to_string();
        }

        tracing::warn!(redirect_to, "off-site recovery redirect replaced");
        format!("{site}{RECOVERY_CALLBACK}")
    }
}

fn session_data(session: &Session, user: User) -> SessionData {
    SessionData {
        session: types::Session {
            access_token: session.token.clone(),
            expires_at: session.expires_at,
            user: user.clone(),
        },
        user,
    }
}
