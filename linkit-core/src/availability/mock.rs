use super::{AvailabilityClient, CheckError};
use crate::types::CheckUsernameResponse;
use crate::validation::normalize_username;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_LATENCY: Duration = Duration::from_millis(300);
const DEFAULT_TAKEN: &[&str] = &["admin", "api", "demo", "linkit", "login", "settings", "signup", "test", "user"];

/// In-memory stand-in for the availability endpoint, with simulated latency.
#[derive(Debug, Clone)]
pub struct MockAvailabilityClient {
    taken: HashSet<String>,
    latency: Duration,
}

impl Default for MockAvailabilityClient {
    fn default() -> Self {
        Self::new(DEFAULT_TAKEN.iter().copied())
    }
}

impl MockAvailabilityClient {
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            taken: taken.into_iter().map(|s| normalize_username(s.as_ref())).collect(),
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.taken.contains(&normalize_username(username))
    }
}

#[async_trait]
impl AvailabilityClient for MockAvailabilityClient {
    async fn check(&self, username: &str, cancel: &CancellationToken) -> Result<CheckUsernameResponse, CheckError> {
        tokio::select! {
            () = cancel.cancelled() => return Err(CheckError::Cancelled),
            () = tokio::time::sleep(self.latency) => {}
        }

        if self.is_taken(username) {
            Ok(CheckUsernameResponse::unavailable("Username is already taken"))
        } else {
            Ok(CheckUsernameResponse::available("Username is available"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn taken_names_compare_case_insensitively() {
        let client = MockAvailabilityClient::new(["Alice"]);
        let token = CancellationToken::new();

        let res = client.check("ALICE", &token).await.unwrap();
        assert!(!res.available);
        assert_eq!(res.message.as_deref(), Some("Username is already taken"));

        let res = client.check("bob", &token).await.unwrap();
        assert!(res.available);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_latency() {
        let client = MockAvailabilityClient::default().with_latency(Duration::from_secs(5));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let res = client.check("someone", &token).await;
        assert!(matches!(res, Err(CheckError::Cancelled)));
    }
}
