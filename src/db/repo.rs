mod account;
mod account_db;
mod auth_code;
mod auth_code_db;
mod memory;
mod profile;
mod profile_db;
mod session;
mod session_db;
mod username;
mod username_db;

pub use account_db::AccountRepository;
pub use auth_code_db::AuthCodeRepository;
pub use profile_db::ProfileRepository;
pub use session_db::SessionRepository;
pub use username_db::UsernameRepository;

pub use account::AccountRepo;
pub use auth_code::AuthCodeRepo;
pub use memory::MemoryStore;
pub use profile::ProfileRepo;
pub use session::SessionRepo;
pub use username::UsernameRepo;
