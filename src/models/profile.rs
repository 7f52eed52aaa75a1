use crate::db::DbResult;
use crate::models::types::AccountId;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

/// Public page data. The id is the owning account's id.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: AccountId,
    /// As typed at claim time; uniqueness is case-insensitive
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: AccountId, username: &str, display_name: Option<String>) -> Self {
        let now = Utc::now();
        let display_name = display_name
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| username.to_string());

        Self {
            id,
            username: username.to_string(),
            display_name: Some(display_name),
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get::<_, AccountId>("id")?,
            username: row.try_get("username")?,
            display_name: row.try_get("display_name")?,
            bio: row.try_get("bio")?,
            avatar_url: row.try_get("avatar_url")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<Profile> for linkit_core::types::Profile {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id.0,
            username: p.username,
            display_name: p.display_name,
            bio: p.bio,
            avatar_url: p.avatar_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
