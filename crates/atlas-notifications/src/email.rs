//! Email delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Email errors
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

pub type EmailResult<T> = Result<T, EmailError>;

/// Email address with optional display name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Format as RFC 5322
    pub fn to_rfc5322(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Email message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub from: EmailAddress,
    pub to: Vec<EmailAddress>,
    pub reply_to: Option<EmailAddress>,
    pub subject: String,
    /// Plain text body, for clients without HTML support
    pub text_body: String,
    pub html_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailMessage {
    pub fn new(
        from: EmailAddress,
        to: Vec<EmailAddress>,
        subject: impl Into<String>,
        text_body: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            from,
            to,
            reply_to: None,
            subject: subject.into(),
            text_body: text_body.into(),
            html_body: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn reply_to(mut self, address: EmailAddress) -> Self {
        self.reply_to = Some(address);
        self
    }
}

/// Mailer trait
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a message, returning its id
    async fn send(&self, message: &EmailMessage) -> EmailResult<String>;

    /// Check if the mailer is configured
    fn is_configured(&self) -> bool;
}

/// Console mailer (for development)
#[derive(Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, message: &EmailMessage) -> EmailResult<String> {
        println!("=== EMAIL ===");
        println!("From: {}", message.from.to_rfc5322());
        println!(
            "To: {}",
            message
                .to
                .iter()
                .map(|a| a.to_rfc5322())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Subject: {}", message.subject);
        println!("---");
        println!("{}", message.text_body);
        if let Some(ref html) = message.html_body {
            println!("--- HTML ---");
            println!("{}", html);
        }
        println!("=============");

        let first_to = message.to.first().map(|a| a.email.as_str()).unwrap_or("-");
        info!(to = first_to, subject = %message.subject, "Email sent to console");
        Ok(message.id.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc5322_formatting() {
        let bare = EmailAddress::new("a@b.test");
        assert_eq!(bare.to_rfc5322(), "a@b.test");

        let named = EmailAddress::new("a@b.test").with_name("Ada");
        assert_eq!(named.to_rfc5322(), "Ada <a@b.test>");
    }

    #[tokio::test]
    async fn test_console_mailer_returns_message_id() {
        let mailer = ConsoleMailer::new();
        let message = EmailMessage::new(
            EmailAddress::new("noreply@atlas.test"),
            vec![EmailAddress::new("user@atlas.test")],
            "Subject",
            "Body",
        );
        let id = mailer.send(&message).await.unwrap();
        assert_eq!(id, message.id);
    }

    #[tokio::test]
    async fn test_console_mailer_handles_empty_recipients() {
        let mailer = ConsoleMailer::new();
        let message = EmailMessage::new(
            EmailAddress::new("noreply@atlas.test"),
            Vec::new(),
            "Subject",
            "Body",
        );
        let id = mailer.send(&message).await.unwrap();
        assert_eq!(id, message.id);
    }
}
