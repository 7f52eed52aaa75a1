mod auth;
mod mailer;
mod profile;
mod rate_limit;
mod username;

pub use auth::{AuthService, CodeExchange};
pub use mailer::{LogMailer, MailMessage, Mailer, RecordingMailer};
pub use profile::ProfileService;
pub use rate_limit::SignInLimiter;
pub use username::UsernameService;
