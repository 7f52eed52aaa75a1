use crate::db::DbResult;
use crate::models::session::Session;

#[async_trait::async_trait]
pub trait SessionRepo: Send + Sync {
    async fn insert(&self, session: &Session) -> DbResult<()>;
    /// Expired sessions are returned as-is; callers decide.
    async fn get(&self, token: &str) -> DbResult<Option<Session>>;
    async fn delete(&self, token: &str) -> DbResult<()>;
    async fn delete_expired(&self) -> DbResult<u64>;
}
