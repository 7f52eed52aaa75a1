use crate::db::error::DbError;
use crate::db::repo::profile::ProfileRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::profile::Profile;
use crate::models::types::AccountId;
use std::sync::Arc;

pub struct ProfileRepository {
    db: Arc<Db>,
}

impl ProfileRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ProfileRepo for ProfileRepository {
    async fn get_by_id(&self, id: AccountId) -> DbResult<Option<Profile>> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("SELECT * FROM profiles WHERE id = $1").await?;

        let row_opt = client.query_opt(&stmt, &[&id]).await?;
        map_row_opt(row_opt, Profile::try_from_row, &format!("ProfileRepo::get_by_id id={}", id))
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<Profile>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT * FROM profiles WHERE lower(username) = lower($1)")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&username]).await?;
        map_row_opt(
            row_opt,
            Profile::try_from_row,
            &format!("ProfileRepo::get_by_username username={}", username),
        )
    }

    async fn update(&self, profile: &Profile) -> DbResult<Profile> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                UPDATE profiles
                SET username = $2, display_name = $3, bio = $4, avatar_url = $5, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .await?;

        let row_opt = client
            .query_opt(
                &stmt,
                &[&profile.id, &profile.username, &profile.display_name, &profile.bio, &profile.avatar_url],
            )
            .await?;

        map_row_opt(row_opt, Profile::try_from_row, &format!("ProfileRepo::update id={}", profile.id))?
            .ok_or(DbError::NotFound)
    }
}
