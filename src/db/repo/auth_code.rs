use crate::db::DbResult;
use crate::models::auth_code::AuthCode;

#[async_trait::async_trait]
pub trait AuthCodeRepo: Send + Sync {
    async fn insert(&self, code: &AuthCode) -> DbResult<()>;
    /// Marks the code used and returns it, or `None` when it is unknown,
    /// expired or already used. At most one caller wins a given code.
    async fn consume(&self, code: &str) -> DbResult<Option<AuthCode>>;
}
