use crate::db::error::DbError;
use linkit_core::ValidationError;
use linkit_core::auth::{AuthErrorCode, AuthFailure};
use thiserror::Error;

pub type AppResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Failure with a stable code the client maps onto its forms
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not logged in")]
    Unauthorized,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Password(#[from] password_hash::Error),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn auth(code: AuthErrorCode, message: impl Into<String>) -> Self {
        DomainError::Auth(AuthFailure::new(code, message))
    }
}

impl From<ValidationError> for DomainError {
    fn from(e: ValidationError) -> Self {
        DomainError::Validation { field: e.field(), message: e.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("invalid environment: {0}")]
    Env(#[source] ConfigErrorKind),

    #[error("network issue: {0}")]
    Net(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
