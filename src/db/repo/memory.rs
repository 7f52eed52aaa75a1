use crate::db::DbResult;
use crate::db::error::DbError;
use crate::db::repo::{AccountRepo, AuthCodeRepo, ProfileRepo, SessionRepo, UsernameRepo};
use crate::models::account::{Account, normalize_email};
use crate::models::auth_code::AuthCode;
use crate::models::profile::Profile;
use crate::models::reserved::{ReservedUsername, SEEDED};
use crate::models::session::Session;
use crate::models::types::AccountId;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;

const EMAIL_INDEX: &str = "accounts_email_lower_idx";
const USERNAME_INDEX: &str = "profiles_username_lower_idx";

/// Ephemeral store backing every repository trait. Used with `--memory` and in tests.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Account>,
    profiles: DashMap<AccountId, Profile>,
    reserved: DashMap<String, ReservedUsername>,
    sessions: DashMap<String, Session>,
    codes: DashMap<String, AuthCode>,
    // unique checks on accounts/profiles
    write: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the same reserved names a migrated database starts with.
    pub fn seeded() -> Self {
        let store = Self::new();
        for name in SEEDED {
            store.insert_reserved(name, None);
        }
        store
    }

    fn insert_reserved(&self, username: &str, reason: Option<&str>) -> bool {
        if self.reserved.contains_key(username) {
            return false;
        }
        self.reserved.insert(
            username.to_string(),
            ReservedUsername {
                username: username.to_string(),
                reason: reason.map(str::to_string),
                created_at: Utc::now(),
            },
        );
        true
    }

    fn username_owner(&self, username: &str) -> Option<AccountId> {
        let lower = username.to_lowercase();
        self.profiles
            .iter()
            .find(|p| p.username.to_lowercase() == lower)
            .map(|p| p.id)
    }
}

#[async_trait]
impl AccountRepo for MemoryStore {
    async fn get_by_id(&self, account_id: AccountId) -> DbResult<Option<Account>> {
        Ok(self.accounts.get(&account_id).map(|a| a.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let email = normalize_email(email);
        Ok(self.accounts.iter().find(|a| a.email == email).map(|a| a.value().clone()))
    }

    async fn insert_with_profile(&self, account: &Account, profile: &Profile) -> DbResult<()> {
        let _guard = self.write.lock();

        if self.accounts.iter().any(|a| a.email == account.email) {
            return Err(DbError::UniqueViolation(EMAIL_INDEX.into()));
        }
        if self.username_owner(&profile.username).is_some() {
            return Err(DbError::UniqueViolation(USERNAME_INDEX.into()));
        }

        self.accounts.insert(account.id, account.clone());
        self.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn confirm_email(&self, account_id: AccountId) -> DbResult<()> {
        if let Some(mut a) = self.accounts.get_mut(&account_id) {
            a.email_confirmed_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }

    async fn update_last_login(&self, account_id: AccountId) -> DbResult<()> {
        if let Some(mut a) = self.accounts.get_mut(&account_id) {
            a.last_login = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn get_by_id(&self, id: AccountId) -> DbResult<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.value().clone()))
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<Profile>> {
        Ok(self
            .username_owner(username)
            .and_then(|id| self.profiles.get(&id).map(|p| p.value().clone())))
    }

    async fn update(&self, profile: &Profile) -> DbResult<Profile> {
        let _guard = self.write.lock();

        if self.username_owner(&profile.username).is_some_and(|owner| owner != profile.id) {
            return Err(DbError::UniqueViolation(USERNAME_INDEX.into()));
        }

        let mut stored = self.profiles.get_mut(&profile.id).ok_or(DbError::NotFound)?;
        *stored = Profile { updated_at: Utc::now(), ..profile.clone() };
        Ok(stored.value().clone())
    }
}

#[async_trait]
impl UsernameRepo for MemoryStore {
    async fn is_available(&self, username: &str) -> DbResult<bool> {
        let name = username.trim().to_lowercase();
        Ok(!self.reserved.contains_key(&name) && self.username_owner(&name).is_none())
    }

    async fn reserve(&self, username: &str, reason: Option<&str>) -> DbResult<bool> {
        Ok(self.insert_reserved(username, reason))
    }

    async fn unreserve(&self, username: &str) -> DbResult<bool> {
        Ok(self.reserved.remove(username).is_some())
    }

    async fn list_reserved(&self) -> DbResult<Vec<ReservedUsername>> {
        let mut names: Vec<_> = self.reserved.iter().map(|r| r.value().clone()).collect();
        names.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(names)
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn insert(&self, session: &Session) -> DbResult<()> {
        self.sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> DbResult<Option<Session>> {
        Ok(self.sessions.get(token).map(|s| s.value().clone()))
    }

    async fn delete(&self, token: &str) -> DbResult<()> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - self.sessions.len()) as u64)
    }
}

#[async_trait]
impl AuthCodeRepo for MemoryStore {
    async fn insert(&self, code: &AuthCode) -> DbResult<()> {
        self.codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume(&self, code: &str) -> DbResult<Option<AuthCode>> {
        let Some(mut stored) = self.codes.get_mut(code) else {
            return Ok(None);
        };

        let now = Utc::now();
        if !stored.is_usable(now) {
            return Ok(None);
        }
        stored.used_at = Some(now);
        Ok(Some(stored.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth_code::CodePurpose;

    fn account(email: &str) -> Account {
        Account::new(email, "hash".into(), true)
    }

    #[tokio::test]
    async fn emails_and_usernames_are_unique_ignoring_case() {
        let store = MemoryStore::new();
        let a = account("ada@example.com");
        store.insert_with_profile(&a, &Profile::new(a.id, "Ada", None)).await.unwrap();

        let b = account("ADA@example.com");
        let err = store.insert_with_profile(&b, &Profile::new(b.id, "other", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(ref c) if c == EMAIL_INDEX));

        let c = account("c@example.com");
        let err = store.insert_with_profile(&c, &Profile::new(c.id, "ada", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(ref c) if c == USERNAME_INDEX));
        assert!(AccountRepo::get_by_id(&store, c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn availability_covers_profiles_and_reserved_names() {
        let store = MemoryStore::seeded();
        let a = account("ada@example.com");
        store.insert_with_profile(&a, &Profile::new(a.id, "Ada", None)).await.unwrap();

        assert!(!store.is_available("ada").await.unwrap());
        assert!(!store.is_available("admin").await.unwrap());
        assert!(store.is_available("grace").await.unwrap());

        assert!(store.unreserve("admin").await.unwrap());
        assert!(store.is_available("admin").await.unwrap());
        assert!(store.reserve("grace", Some("staff")).await.unwrap());
        assert!(!store.reserve("grace", None).await.unwrap());
        assert!(!store.is_available("grace").await.unwrap());
    }

    #[tokio::test]
    async fn codes_are_consumed_once() {
        let store = MemoryStore::new();
        let code = AuthCode::issue(AccountId::new(), CodePurpose::Recovery);
        AuthCodeRepo::insert(&store, &code).await.unwrap();

        assert!(store.consume(&code.code).await.unwrap().is_some());
        assert!(store.consume(&code.code).await.unwrap().is_none());
        assert!(store.consume("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn renaming_onto_a_taken_username_fails() {
        let store = MemoryStore::new();
        let a = account("a@example.com");
        let b = account("b@example.com");
        store.insert_with_profile(&a, &Profile::new(a.id, "alpha", None)).await.unwrap();
        store.insert_with_profile(&b, &Profile::new(b.id, "beta", None)).await.unwrap();

        let mut p = ProfileRepo::get_by_id(&store, b.id).await.unwrap().unwrap();
        p.username = "Alpha".into();
        assert!(store.update(&p).await.unwrap_err().is_unique_violation());

        p.username = "Beta".into();
        assert_eq!(store.update(&p).await.unwrap().username, "Beta");
    }
}
