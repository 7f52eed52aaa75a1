use crate::types::CheckUsernameResponse;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

mod http; // Remote endpoint
mod mock; // Static taken list

pub use http::HttpAvailabilityClient;
pub use mock::MockAvailabilityClient;

/// Message used when the server rejects a check without saying why.
pub const REJECTED_MESSAGE: &str = "Unable to check availability";

#[derive(Debug, Error)]
pub enum CheckError {
    /// The caller cancelled the check. Not a user visible error.
    #[error("availability check cancelled")]
    Cancelled,

    /// Network or decode failure.
    #[error("availability check failed: {0}")]
    Transport(String),
}

impl CheckError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CheckError::Cancelled)
    }
}

/// Answers whether a username can still be claimed.
///
/// Implementations receive the name as typed (already format-validated) and
/// must return [`CheckError::Cancelled`] once `cancel` fires. A rejected request
/// with a readable body is not an error: it comes back as `available: false`
/// with the server's message.
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    async fn check(&self, username: &str, cancel: &CancellationToken) -> Result<CheckUsernameResponse, CheckError>;
}
