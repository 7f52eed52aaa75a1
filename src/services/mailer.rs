use crate::error::AppResult;
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    /// Link the recipient has to follow
    pub link: String,
}

/// Outgoing mail for confirmation and recovery links.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// Writes mails to the log. Good enough for development.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        tracing::info!(to = %message.to, subject = %message.subject, link = %message.link, "mail");
        Ok(())
    }
}

/// Keeps every mail in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent.lock().iter().rev().find(|m| m.to == to).cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}
