use crate::db::repo::UsernameRepo;
use crate::error::AppResult;
use crate::models::reserved::ReservedUsername;
use linkit_core::{normalize_username, validate_username};
use std::sync::Arc;

pub struct UsernameService {
    repo: Arc<dyn UsernameRepo>,
}

impl UsernameService {
    pub fn new(repo: Arc<dyn UsernameRepo>) -> Self {
        Self { repo }
    }

    /// Validates the raw input, then checks claimed and reserved names
    /// case-insensitively.
    pub async fn is_available(&self, raw: &str) -> AppResult<bool> {
        validate_username(raw)?;
        let available = self.repo.is_available(&normalize_username(raw)).await?;
        tracing::debug!(username = %raw, available, "username lookup");
        Ok(available)
    }

    pub async fn reserve(&self, raw: &str, reason: Option<&str>) -> AppResult<bool> {
        validate_username(raw)?;
        Ok(self.repo.reserve(&normalize_username(raw), reason).await?)
    }

    pub async fn unreserve(&self, raw: &str) -> AppResult<bool> {
        Ok(self.repo.unreserve(&normalize_username(raw)).await?)
    }

    pub async fn reserved(&self) -> AppResult<Vec<ReservedUsername>> {
        Ok(self.repo.list_reserved().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::MemoryStore;
    use crate::error::DomainError;

    #[tokio::test]
    async fn reserved_names_are_never_available() {
        let svc = UsernameService::new(Arc::new(MemoryStore::seeded()));
        assert!(!svc.is_available("Admin").await.unwrap());
        assert!(svc.is_available("nova").await.unwrap());

        assert!(svc.reserve("Nova", Some("launch")).await.unwrap());
        assert!(!svc.is_available("nova").await.unwrap());
        assert!(svc.reserved().await.unwrap().iter().any(|r| r.username == "nova"));

        assert!(svc.unreserve("NOVA").await.unwrap());
        assert!(svc.is_available("nova").await.unwrap());
    }

    #[tokio::test]
    async fn invalid_format_is_a_validation_error() {
        let svc = UsernameService::new(Arc::new(MemoryStore::new()));
        match svc.is_available("-bad").await {
            Err(DomainError::Validation { field, message }) => {
                assert_eq!(field, "username");
                assert_eq!(message, "Username can only contain letters, numbers, hyphens, and underscores");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
