use super::{Db, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::str::FromStr;
use tokio_postgres::NoTls;

impl Db {
    pub fn new(url: &str, max_size: usize) -> DbResult<Self> {
        let cfg = tokio_postgres::Config::from_str(url)?;

        let mgr = Manager::from_config(
            cfg,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(mgr).max_size(max_size).runtime(Runtime::Tokio1).build()?;
        tracing::debug!(max_size, "database pool ready");

        Ok(Self { pool })
    }
}
