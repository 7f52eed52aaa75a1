use crate::db::error::DbError;
use crate::db::repo::{ProfileRepo, UsernameRepo};
use crate::error::{AppResult, DomainError};
use crate::models::profile::Profile;
use crate::models::types::AccountId;
use linkit_core::auth::AuthErrorCode;
use linkit_core::types::ProfileUpdate;
use linkit_core::{normalize_username, validate_username};
use std::sync::Arc;

pub(crate) const USERNAME_TAKEN: &str = "Username is already taken";

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepo>,
    usernames: Arc<dyn UsernameRepo>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepo>, usernames: Arc<dyn UsernameRepo>) -> Self {
        Self { profiles, usernames }
    }

    pub async fn get_by_id(&self, id: AccountId) -> AppResult<Option<Profile>> {
        Ok(self.profiles.get_by_id(id).await?)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<Profile>> {
        Ok(self.profiles.get_by_username(username).await?)
    }

    /// Applies a partial update. Blank text fields clear the value.
    pub async fn update(&self, id: AccountId, update: &ProfileUpdate) -> AppResult<Profile> {
        let mut profile = self
            .profiles
            .get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("profile {id}")))?;

        if let Some(username) = &update.username {
            validate_username(username)?;

            // A case-only change keeps the same claim
            let same_claim = normalize_username(username) == normalize_username(&profile.username);
            if !same_claim && !self.usernames.is_available(&normalize_username(username)).await? {
                return Err(DomainError::auth(AuthErrorCode::UsernameTaken, USERNAME_TAKEN));
            }
            profile.username = username.clone();
        }
        if let Some(v) = &update.display_name {
            profile.display_name = non_blank(v);
        }
        if let Some(v) = &update.bio {
            profile.bio = non_blank(v);
        }
        if let Some(v) = &update.avatar_url {
            profile.avatar_url = non_blank(v);
        }

        match self.profiles.update(&profile).await {
            Ok(p) => {
                tracing::info!(id = %id, username = %p.username, "profile updated");
                Ok(p)
            }
            Err(DbError::UniqueViolation(_)) => Err(DomainError::auth(AuthErrorCode::UsernameTaken, USERNAME_TAKEN)),
            Err(e) => Err(e.into()),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::AccountRepo;
    use crate::db::repo::MemoryStore;
    use crate::models::account::Account;

    async fn setup() -> (ProfileService, AccountId) {
        let store = Arc::new(MemoryStore::seeded());
        let a = Account::new("a@example.com", "hash".into(), true);
        store.insert_with_profile(&a, &Profile::new(a.id, "alpha", None)).await.unwrap();
        let b = Account::new("b@example.com", "hash".into(), true);
        store.insert_with_profile(&b, &Profile::new(b.id, "beta", None)).await.unwrap();

        (ProfileService::new(store.clone(), store), b.id)
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let (svc, id) = setup().await;
        let p = svc
            .update(id, &ProfileUpdate { bio: Some("  hello  ".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(p.bio.as_deref(), Some("hello"));
        assert_eq!(p.display_name.as_deref(), Some("beta"));

        let p = svc.update(id, &ProfileUpdate { bio: Some("".into()), ..Default::default() }).await.unwrap();
        assert_eq!(p.bio, None);
    }

    #[tokio::test]
    async fn username_changes_are_checked() {
        let (svc, id) = setup().await;

        let taken = ProfileUpdate { username: Some("ALPHA".into()), ..Default::default() };
        match svc.update(id, &taken).await {
            Err(DomainError::Auth(f)) => assert_eq!(f.code, AuthErrorCode::UsernameTaken),
            other => panic!("unexpected: {other:?}"),
        }

        let reserved = ProfileUpdate { username: Some("settings".into()), ..Default::default() };
        assert!(svc.update(id, &reserved).await.is_err());

        let invalid = ProfileUpdate { username: Some("b".into()), ..Default::default() };
        assert!(matches!(svc.update(id, &invalid).await, Err(DomainError::Validation { .. })));

        let recased = ProfileUpdate { username: Some("Beta".into()), ..Default::default() };
        assert_eq!(svc.update(id, &recased).await.unwrap().username, "Beta");
        assert!(svc.get_by_username("BETA").await.unwrap().is_some());
    }
}
