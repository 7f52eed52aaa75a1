use crate::db::repo::auth_code::AuthCodeRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::auth_code::AuthCode;
use std::sync::Arc;

pub struct AuthCodeRepository {
    db: Arc<Db>,
}

impl AuthCodeRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl AuthCodeRepo for AuthCodeRepository {
    async fn insert(&self, code: &AuthCode) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO auth_codes (code, account_id, purpose, created_at, expires_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .await?;
        client
            .execute(
                &stmt,
                &[&code.code, &code.account_id, &code.purpose, &code.created_at, &code.expires_at],
            )
            .await?;

        Ok(())
    }

    async fn consume(&self, code: &str) -> DbResult<Option<AuthCode>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                UPDATE auth_codes SET used_at = NOW()
                WHERE code = $1 AND used_at IS NULL AND expires_at > NOW()
                RETURNING *
                "#,
            )
            .await?;

        let row_opt = client.query_opt(&stmt, &[&code]).await?;
        map_row_opt(row_opt, AuthCode::try_from_row, "AuthCodeRepo::consume")
    }
}
