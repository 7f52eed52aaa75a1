use crate::db::DbResult;
use crate::models::types::{AccountId, random_token};
use chrono::{DateTime, Duration, Utc};
use tokio_postgres::Row;

const TOKEN_LEN: usize = 48;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn issue(account_id: AccountId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            token: random_token(TOKEN_LEN),
            account_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            token: row.try_get("token")?,
            account_id: row.try_get::<_, AccountId>("account_id")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
