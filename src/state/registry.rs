use crate::config::Config;
use crate::db::Db;
use crate::db::repo::{AccountRepo, AccountRepository, AuthCodeRepo, AuthCodeRepository, MemoryStore};
use crate::db::repo::{ProfileRepo, ProfileRepository, SessionRepo, SessionRepository, UsernameRepo, UsernameRepository};
use crate::services::{AuthService, Mailer, ProfileService, UsernameService};
use std::sync::Arc;

pub struct Repos {
    pub account: Arc<dyn AccountRepo>,
    pub profile: Arc<dyn ProfileRepo>,
    pub username: Arc<dyn UsernameRepo>,
    pub session: Arc<dyn SessionRepo>,
    pub auth_code: Arc<dyn AuthCodeRepo>,
}

impl Repos {
    pub fn postgres(db: Arc<Db>) -> Self {
        Self {
            account: Arc::new(AccountRepository::new(db.clone())),
            profile: Arc::new(ProfileRepository::new(db.clone())),
            username: Arc::new(UsernameRepository::new(db.clone())),
            session: Arc::new(SessionRepository::new(db.clone())),
            auth_code: Arc::new(AuthCodeRepository::new(db)),
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            account: store.clone(),
            profile: store.clone(),
            username: store.clone(),
            session: store.clone(),
            auth_code: store,
        }
    }
}

pub struct Services {
    pub auth: Arc<AuthService>,
    pub profile: Arc<ProfileService>,
    pub username: Arc<UsernameService>,
}

pub struct Registry {
    pub repos: Arc<Repos>,
    pub services: Arc<Services>,
    pub config: Arc<Config>,
}

impl Registry {
    pub fn new(db: Arc<Db>, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_repos(Repos::postgres(db), config, mailer)
    }

    /// Registry over a fresh seeded [`MemoryStore`].
    pub fn in_memory(config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_repos(Repos::memory(Arc::new(MemoryStore::seeded())), config, mailer)
    }

    pub fn with_repos(repos: Repos, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        let repos = Arc::new(repos);

        let services = Arc::new(Services {
            auth: Arc::new(AuthService::new(
                repos.account.clone(),
                repos.profile.clone(),
                repos.username.clone(),
                repos.session.clone(),
                repos.auth_code.clone(),
                mailer,
                config.clone(),
            )),
            profile: Arc::new(ProfileService::new(repos.profile.clone(), repos.username.clone())),
            username: Arc::new(UsernameService::new(repos.username.clone())),
        });

        Self { repos, services, config }
    }
}
