use crate::db::repo::account::AccountRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::account::{Account, normalize_email};
use crate::models::profile::Profile;
use crate::models::types::AccountId;
use std::sync::Arc;

pub struct AccountRepository {
    db: Arc<Db>,
}

impl AccountRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AccountRepo for AccountRepository {
    async fn get_by_id(&self, account_id: AccountId) -> DbResult<Option<Account>> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("SELECT * FROM accounts WHERE id = $1").await?;

        let row_opt = client.query_opt(&stmt, &[&account_id]).await?;
        map_row_opt(row_opt, Account::try_from_row, &format!("AccountRepo::get_by_id id={}", account_id))
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT * FROM accounts WHERE lower(email) = $1")
            .await?;

        let email = normalize_email(email);
        let row_opt = client.query_opt(&stmt, &[&email]).await?;
        map_row_opt(row_opt, Account::try_from_row, &format!("AccountRepo::get_by_email email={}", email))
    }

    async fn insert_with_profile(&self, account: &Account, profile: &Profile) -> DbResult<()> {
        let mut client = self.db.get_client().await?;
        let tx = client.transaction().await?;

        tx.execute(
            r#"
            INSERT INTO accounts (id, email, password_hash, email_confirmed_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            &[
                &account.id,
                &account.email,
                &account.password_hash,
                &account.email_confirmed_at,
                &account.created_at,
            ],
        )
        .await?;

        tx.execute(
            r#"
            INSERT INTO profiles (id, username, display_name, bio, avatar_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            &[
                &profile.id,
                &profile.username,
                &profile.display_name,
                &profile.bio,
                &profile.avatar_url,
                &profile.created_at,
                &profile.updated_at,
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn confirm_email(&self, account_id: AccountId) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE accounts SET email_confirmed_at = COALESCE(email_confirmed_at, NOW()) WHERE id = $1")
            .await?;
        client.execute(&stmt, &[&account_id]).await?;

        Ok(())
    }

    async fn update_last_login(&self, account_id: AccountId) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE accounts SET last_login = NOW() WHERE id = $1")
            .await?;
        client.execute(&stmt, &[&account_id]).await?;

        Ok(())
    }
}
