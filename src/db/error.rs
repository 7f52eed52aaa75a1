use deadpool_postgres::{BuildError, PoolError};
use thiserror::Error;
use tokio_postgres::error::SqlState;

// DbError is the lowest level error type, wrapping errors from the database layer. It does not wrap
// any higher level errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Record not found
    #[error("not found")]
    NotFound,

    /// Unique constraint violation, with the constraint or index name when known
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Pg(tokio_postgres::Error),

    #[error(transparent)]
    Migrate(#[from] refinery::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("row decode error: {0}")]
    Decode(String),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let constraint = e
                .as_db_error()
                .and_then(|d| d.constraint())
                .unwrap_or_default()
                .to_string();
            return DbError::UniqueViolation(constraint);
        }
        DbError::Pg(e)
    }
}
