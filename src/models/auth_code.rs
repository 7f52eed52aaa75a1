use crate::db::DbResult;
use crate::models::types::{AccountId, random_token};
use chrono::{DateTime, Duration, Utc};
use postgres_types::private::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type};
use std::error::Error;
use tokio_postgres::Row;

const CODE_LEN: usize = 32;

/// What a mailed code is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    /// Confirms the email address of a fresh account
    Signup,
    /// Signs the user in so a new password can be set
    Recovery,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::Signup => "signup",
            CodePurpose::Recovery => "recovery",
        }
    }

    /// How long a mailed link stays valid.
    pub fn ttl(&self) -> Duration {
        match self {
            CodePurpose::Signup => Duration::hours(24),
            CodePurpose::Recovery => Duration::hours(1),
        }
    }
}

impl ToSql for CodePurpose {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.as_str().to_sql(ty, out)
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }

    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

impl FromSql<'_> for CodePurpose {
    fn from_sql(ty: &Type, raw: &[u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let s = String::from_sql(ty, raw)?;
        match s.as_str() {
            "signup" => Ok(CodePurpose::Signup),
            "recovery" => Ok(CodePurpose::Recovery),
            _ => Err(format!("Unknown auth code purpose: {}", s).into()),
        }
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }
}

impl std::fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single use code mailed to the account owner.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub code: String,
    pub account_id: AccountId,
    pub purpose: CodePurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl AuthCode {
    pub fn issue(account_id: AccountId, purpose: CodePurpose) -> Self {
        let now = Utc::now();
        Self {
            code: random_token(CODE_LEN),
            account_id,
            purpose,
            created_at: now,
            expires_at: now + purpose.ttl(),
            used_at: None,
        }
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            code: row.try_get("code")?,
            account_id: row.try_get::<_, AccountId>("account_id")?,
            purpose: row.try_get("purpose")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
            used_at: row.try_get("used_at")?,
        })
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}
