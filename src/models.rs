pub mod account;
pub mod auth_code;
pub mod profile;
pub mod reserved;
pub mod session;
pub mod types;
