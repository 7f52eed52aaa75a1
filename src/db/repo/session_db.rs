use crate::db::repo::session::SessionRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::session::Session;
use std::sync::Arc;

pub struct SessionRepository {
    db: Arc<Db>,
}

impl SessionRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl SessionRepo for SessionRepository {
    async fn insert(&self, session: &Session) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("INSERT INTO sessions (token, account_id, created_at, expires_at) VALUES ($1, $2, $3, $4)")
            .await?;
        client
            .execute(&stmt, &[&session.token, &session.account_id, &session.created_at, &session.expires_at])
            .await?;

        Ok(())
    }

    async fn get(&self, token: &str) -> DbResult<Option<Session>> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("SELECT * FROM sessions WHERE token = $1").await?;

        let row_opt = client.query_opt(&stmt, &[&token]).await?;
        map_row_opt(row_opt, Session::try_from_row, "SessionRepo::get")
    }

    async fn delete(&self, token: &str) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("DELETE FROM sessions WHERE token = $1").await?;
        client.execute(&stmt, &[&token]).await?;

        Ok(())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("DELETE FROM sessions WHERE expires_at <= NOW()").await?;
        Ok(client.execute(&stmt, &[]).await?)
    }
}
