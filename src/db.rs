use crate::db::error::DbError;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

mod migrations;
mod pool;

pub mod error;
pub mod repo;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone, Debug)]
pub struct Db {
    pub(crate) pool: Pool,
}

impl Db {
    pub async fn get_client(&self) -> DbResult<deadpool_postgres::Client> {
        Ok(self.pool.get().await?)
    }
}

pub fn map_row_opt<T, F>(row_opt: Option<Row>, f: F, ctx: &str) -> DbResult<Option<T>>
where
    F: FnOnce(&Row) -> DbResult<T>,
{
    match row_opt {
        Some(row) => match f(&row) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                tracing::error!(error = %e, context = %ctx, "row mapping failed");
                Err(e)
            }
        },
        None => Ok(None),
    }
}

pub fn map_rows<T, F>(rows: &[Row], f: F, ctx: &str) -> DbResult<Vec<T>>
where
    F: Fn(&Row) -> DbResult<T>,
{
    rows.iter()
        .map(|row| {
            f(row).inspect_err(|e| tracing::error!(error = %e, context = %ctx, "row mapping failed"))
        })
        .collect()
}
