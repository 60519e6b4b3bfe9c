//! Email alert delivery via SMTP.
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport to send HTML alert
//! emails with optional inline images. Configuration is loaded from
//! environment variables; if `EMAIL_USER` or `EMAIL_PASS` is not set,
//! [`EmailConfig::from_env`] returns `None` and the email channel is skipped.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP relay.
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration for the SMTP email channel.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Account name, also used as the "From" address and fallback recipient.
    pub user: String,
    /// Account password (app password for Gmail).
    pub password: String,
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable     | Required | Default          |
    /// |--------------|----------|------------------|
    /// | `EMAIL_USER` | yes      | -                |
    /// | `EMAIL_PASS` | yes      | -                |
    /// | `SMTP_HOST`  | no       | `smtp.gmail.com` |
    /// | `SMTP_PORT`  | no       | `587`            |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading through `lookup`.
    ///
    /// Quotes are stripped from the password: `.env` files often carry Gmail
    /// app passwords as `"abcd efgh ijkl mnop"`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let user = non_empty("EMAIL_USER")?;
        let password = non_empty("EMAIL_PASS")?.replace('"', "");
        Some(Self {
            user,
            password,
            smtp_host: non_empty("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port: non_empty("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
        })
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Binary part embedded in the HTML body and referenced by `cid:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    pub filename: String,
    pub content_id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully rendered alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<InlineAttachment>,
}

/// "Send one HTML email with inline attachments."
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Address alerts are sent from; also the fallback recipient.
    fn sender(&self) -> &str;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// Sends alert emails via SMTP with STARTTLS.
pub struct SmtpMailer {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Build the SMTP transport. No connection is opened until the first send.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();
        Ok(Self { config, transport })
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    fn sender(&self) -> &str {
        &self.config.user
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = build_message(email)?;
        self.transport.send(message).await?;

        tracing::info!(to = %email.to, subject = %email.subject, "Alert email sent");
        Ok(())
    }
}

/// Assemble the MIME message: a bare HTML part, or a `multipart/related`
/// body when inline images are attached.
fn build_message(email: &OutgoingEmail) -> Result<Message, EmailError> {
    let builder = Message::builder()
        .from(email.from.parse()?)
        .to(email.to.parse()?)
        .subject(email.subject.clone());

    let html = SinglePart::html(email.html.clone());
    let message = if email.attachments.is_empty() {
        builder.singlepart(html)
    } else {
        let mut related = MultiPart::related().singlepart(html);
        for attachment in &email.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| EmailError::Build(e.to_string()))?;
            related = related.singlepart(
                Attachment::new_inline_with_name(
                    attachment.content_id.clone(),
                    attachment.filename.clone(),
                )
                .body(attachment.bytes.clone(), content_type),
            );
        }
        builder.multipart(related)
    };

    message.map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
