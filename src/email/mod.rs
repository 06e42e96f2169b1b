//! Outbound email boundary.
//!
//! Delivery is an external collaborator: the auth service only knows
//! the [`Mailer`] trait. SMTP goes through lettre; when SMTP is
//! disabled the reset link lands in the log instead.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::SmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, Transport};
use tracing::info;

use crate::config::EmailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<()>;
}

pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        SmtpTransport::relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to configure SMTP relay: {e}"))
            .map(|builder| builder.port(self.config.smtp_port).credentials(creds).build())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject("Reset your password")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "A password reset was requested for this address.\n\n\
                 Open the link below within one hour to choose a new password:\n\n\
                 {reset_url}\n\n\
                 If you did not request this, you can ignore this email."
            ))?;

        let transport = self.transport()?;

        // lettre's SmtpTransport is blocking; keep it off the runtime.
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| anyhow!("Email send task panicked: {e}"))?
            .map_err(|e| anyhow!("Failed to send reset email: {e}"))?;

        Ok(())
    }
}

/// Fallback used when SMTP is disabled (development, tests).
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, reset_url: &str) -> Result<()> {
        info!("Password reset requested for {to}: {reset_url}");
        Ok(())
    }
}
