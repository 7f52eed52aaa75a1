use crate::db::DbResult;
use crate::models::profile::Profile;
use crate::models::types::AccountId;

#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_by_id(&self, id: AccountId) -> DbResult<Option<Profile>>;
    /// Case-insensitive lookup
    async fn get_by_username(&self, username: &str) -> DbResult<Option<Profile>>;
    /// Stores every editable field and bumps `updated_at`.
    async fn update(&self, profile: &Profile) -> DbResult<Profile>;
}
