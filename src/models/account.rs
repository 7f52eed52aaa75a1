use crate::db::DbResult;
use crate::models::types::AccountId;
use chrono::{DateTime, Utc};
use linkit_core::types::User;
use tokio_postgres::Row;

#[derive(Debug, Clone)]
pub struct Account {
    /// Unique Account ID, shared with the profile
    pub id: AccountId,
    /// Email address, stored lower-cased
    pub email: String,
    /// Hashed password (argon)
    pub password_hash: String,
    /// Set once the sign-up link has been followed
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(email: &str, password_hash: String, confirmed: bool) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email: normalize_email(email),
            password_hash,
            email_confirmed_at: confirmed.then_some(now),
            created_at: now,
            last_login: None,
        }
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get::<_, AccountId>("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            email_confirmed_at: row.try_get("email_confirmed_at")?,
            created_at: row.try_get("created_at")?,
            last_login: row.try_get("last_login")?,
        })
    }

    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    pub fn to_user(&self, username: Option<String>) -> User {
        User {
            id: self.id.0,
            email: self.email.clone(),
            username,
            email_confirmed: self.is_confirmed(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
