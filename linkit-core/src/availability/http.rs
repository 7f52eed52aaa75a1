use super::{AvailabilityClient, CheckError, REJECTED_MESSAGE};
use crate::types::CheckUsernameResponse;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Calls `GET {base_url}/api/check-username?username=<raw>`.
#[derive(Debug, Clone)]
pub struct HttpAvailabilityClient {
    http: Client,
    endpoint: String,
}

impl HttpAvailabilityClient {
    pub fn new(base_url: &str) -> Result<Self, CheckError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CheckError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/check-username", base_url.trim_end_matches('/')),
        })
    }

    async fn request(&self, username: &str) -> Result<CheckUsernameResponse, CheckError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("username", username)])
            .send()
            .await
            .map_err(|e| CheckError::Transport(e.to_string()))?;

        let status = resp.status();
        let body: CheckUsernameResponse = resp.json().await.map_err(|e| CheckError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(%status, username, "availability check rejected");
            return Ok(CheckUsernameResponse {
                available: false,
                message: Some(body.message.unwrap_or_else(|| REJECTED_MESSAGE.to_string())),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl AvailabilityClient for HttpAvailabilityClient {
    async fn check(&self, username: &str, cancel: &CancellationToken) -> Result<CheckUsernameResponse, CheckError> {
        if cancel.is_cancelled() {
            return Err(CheckError::Cancelled);
        }

        // Dropping the request future aborts the connection.
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CheckError::Cancelled),
            res = self.request(username) => res,
        }
    }
}
