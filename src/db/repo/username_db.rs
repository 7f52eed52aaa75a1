use crate::db::repo::username::UsernameRepo;
use crate::db::{Db, DbResult, map_rows};
use crate::models::reserved::ReservedUsername;
use std::sync::Arc;

pub struct UsernameRepository {
    db: Arc<Db>,
}

impl UsernameRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UsernameRepo for UsernameRepository {
    async fn is_available(&self, username: &str) -> DbResult<bool> {
        let client = self.db.get_client().await?;

        let stmt = client.prepare_cached("SELECT is_username_available($1) AS available").await?;
        let row = client.query_one(&stmt, &[&username]).await?;

        Ok(row.try_get("available")?)
    }

    async fn reserve(&self, username: &str, reason: Option<&str>) -> DbResult<bool> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("INSERT INTO reserved_usernames (username, reason) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .await?;
        let n = client.execute(&stmt, &[&username, &reason]).await?;

        Ok(n == 1)
    }

    async fn unreserve(&self, username: &str) -> DbResult<bool> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("DELETE FROM reserved_usernames WHERE username = $1")
            .await?;
        let n = client.execute(&stmt, &[&username]).await?;

        Ok(n == 1)
    }

    async fn list_reserved(&self) -> DbResult<Vec<ReservedUsername>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT * FROM reserved_usernames ORDER BY username")
            .await?;
        let rows = client.query(&stmt, &[]).await?;

        map_rows(&rows, ReservedUsername::try_from_row, "UsernameRepo::list_reserved")
    }
}
