//! Email notifier.
//!
//! One message per profile, one paragraph per slot record. Messages go out
//! through a [`MailTransport`]; the SMTP implementation is built explicitly
//! by the caller and lives as long as the caller keeps it.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;
use vaxwatch_core::message::{email_content, EmailContent};
use vaxwatch_core::{Notifier, NotifyError, SlotRecord};

/// Something that can deliver a plain-text email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), NotifyError>;
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpRelayOptions {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub starttls: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for SmtpRelayOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpRelayOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Outbound SMTP relay.
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpRelay {
    /// Build the transport. No connection is opened until the first send.
    pub fn new(options: &SmtpRelayOptions) -> Result<Self, NotifyError> {
        let from: Mailbox = options
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("invalid sender {}: {e}", options.from)))?;

        let builder = if options.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&options.host)
                .map_err(|e| delivery_failed(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&options.host)
        };
        let builder = builder.port(options.port);
        let builder = match (&options.user, &options.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpRelay {
    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), NotifyError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("invalid recipient {to}: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(content.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(content.body.clone())
            .map_err(|e| NotifyError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| delivery_failed(e.to_string()))?;
        Ok(())
    }
}

fn delivery_failed(reason: String) -> NotifyError {
    NotifyError::DeliveryFailed {
        channel: "email".into(),
        reason,
    }
}

/// Email notifier for one profile.
pub struct EmailNotifier {
    profile: String,
    destinator: String,
    transport: Arc<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(
        profile: impl Into<String>,
        destinator: impl Into<String>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            profile: profile.into(),
            destinator: destinator.into(),
            transport,
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn notify(&self, records: &[SlotRecord]) -> Result<(), NotifyError> {
        if records.is_empty() {
            return Ok(());
        }
        let content = email_content(&self.profile, records);
        self.transport.send(&self.destinator, &content).await?;
        info!(
            profile = %self.profile,
            records = records.len(),
            "Email sent"
        );
        Ok(())
    }
}
