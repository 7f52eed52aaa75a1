use crate::db::DbResult;
use crate::models::reserved::ReservedUsername;

/// Username ownership across claimed profiles and the reserved list. All
/// names passed in are expected to be normalized.
#[async_trait::async_trait]
pub trait UsernameRepo: Send + Sync {
    /// Neither claimed by a profile nor reserved
    async fn is_available(&self, username: &str) -> DbResult<bool>;
    /// Returns false when the name was already reserved.
    async fn reserve(&self, username: &str, reason: Option<&str>) -> DbResult<bool>;
    /// Returns false when the name was not reserved.
    async fn unreserve(&self, username: &str) -> DbResult<bool>;
    async fn list_reserved(&self) -> DbResult<Vec<ReservedUsername>>;
}
