use crate::db::DbResult;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

/// A name that can never be claimed.
#[derive(Debug, Clone)]
pub struct ReservedUsername {
    pub username: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReservedUsername {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            username: row.try_get("username")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Names reserved by the initial migration.
pub const SEEDED: &[&str] = &[
    "admin",
    "api",
    "dashboard",
    "settings",
    "login",
    "signup",
    "forgot-password",
    "reset-password",
    "username",
    "linkit",
    "support",
];
