//! Outbound mail.
//!
//! Services hold a [`Mailer`] and never talk to SMTP directly. Delivery is
//! attempted once; failures surface as [`AppError::DependencyFailure`].

use std::sync::Arc;

use async_trait::async_trait;
use inkwell_common::{AppError, AppResult, config::MailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tokio::sync::Mutex;

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text_body: String,
}

/// Sends one email per call.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `message`.
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// Shared mailer handle.
pub type MailerRef = Arc<dyn Mailer>;

/// SMTP delivery through a STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer for `host`.
    pub fn new(config: &MailConfig, host: &str) -> AppResult<Self> {
        let from: Mailbox = config
            .sender
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient address: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        self.transport.send(email).await.map_err(|e| {
            tracing::warn!(error = %e, "SMTP delivery failed");
            AppError::DependencyFailure(format!("SMTP delivery failed: {e}"))
        })?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them. Used when no SMTP host is set.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, email not sent"
        );
        tracing::debug!(body = %message.text_body, "Unsent email body");
        Ok(())
    }
}

/// Keeps messages in memory.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl MemoryMailer {
    /// A mailer that records every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Messages delivered so far.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        if self.fail {
            return Err(AppError::DependencyFailure(
                "mail transport unavailable".to_string(),
            ));
        }
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Pick the mailer for the configuration.
pub fn mailer_from_config(config: &MailConfig) -> AppResult<MailerRef> {
    match &config.smtp_host {
        Some(host) => {
            tracing::info!(host = %host, port = config.smtp_port, "Using SMTP mailer");
            Ok(Arc::new(SmtpMailer::new(config, host)?))
        }
        None => {
            tracing::warn!("No SMTP host configured, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
