use crate::db::DbResult;
use crate::models::account::Account;
use crate::models::profile::Profile;
use crate::models::types::AccountId;

#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    async fn get_by_id(&self, account_id: AccountId) -> DbResult<Option<Account>>;
    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>>;
    /// Creates the account and its profile together. A taken email or
    /// username fails with `DbError::UniqueViolation` and creates neither.
    async fn insert_with_profile(&self, account: &Account, profile: &Profile) -> DbResult<()>;
    async fn confirm_email(&self, account_id: AccountId) -> DbResult<()>;
    async fn update_last_login(&self, account_id: AccountId) -> DbResult<()>;
}
