//! Verification-code delivery.

use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::domain::repository::NotificationSender;
use crate::error::AuthServiceError;

pub const VERIFICATION_SUBJECT: &str = "Your Verification Code";

pub fn verification_body(code: &str) -> String {
    format!("<h2>Your verification code is: {code}</h2>")
}

/// Sends codes through an SMTP relay (STARTTLS).
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP host {}", config.host))?
            .port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        let from = config
            .from
            .parse()
            .with_context(|| format!("invalid SMTP_FROM {}", config.from))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn message(&self, email: &str, code: &str) -> anyhow::Result<Message> {
        let to: Mailbox = email
            .parse()
            .with_context(|| format!("invalid recipient {email}"))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(verification_body(code))
            .context("build verification email")
    }
}

impl NotificationSender for SmtpMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        let message = self.message(email, code).map_err(AuthServiceError::Delivery)?;
        self.transport
            .send(message)
            .await
            .context("smtp send")
            .map_err(AuthServiceError::Delivery)?;
        Ok(())
    }
}

/// Development sender: writes the code to the log instead of mailing it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl NotificationSender for LogMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        info!(to_email = %email, code = %code, "verification code send stub");
        Ok(())
    }
}

/// Sender chosen at startup from the SMTP settings.
#[derive(Clone)]
pub enum Mailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl Mailer {
    pub fn from_config(smtp: Option<&SmtpConfig>) -> anyhow::Result<Self> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Log(LogMailer)),
        }
    }
}

impl NotificationSender for Mailer {
    async fn send_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<(), AuthServiceError> {
        match self {
            Self::Smtp(m) => m.send_verification_code(email, code).await,
            Self::Log(m) => m.send_verification_code(email, code).await,
        }
    }
}
