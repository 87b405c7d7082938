use std::env;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::EmailConfig;
use crate::digest::RenderedDigest;
use crate::types::{DigestError, Result};

/// SMTP connection settings, taken from the environment so credentials stay
/// out of the config files.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_password: String,
}

impl SmtpSettings {
    pub fn from_env() -> Result<Self> {
        let server = require_env("SMTP_SERVER")?;
        let port = require_env("SMTP_PORT")?
            .parse::<u16>()
            .map_err(|e| DigestError::Config(format!("invalid SMTP_PORT: {}", e)))?;
        let sender_email = require_env("SENDER_EMAIL")?;
        let sender_password = require_env("SENDER_PASSWORD")?;
        Ok(Self {
            server,
            port,
            sender_email,
            sender_password,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| DigestError::Config(format!("missing environment variable {}", name)))
}

/// Build the digest message for the configured recipients.
pub fn build_message(
    digest: &RenderedDigest,
    sender_email: &str,
    recipients: &[String],
) -> Result<Message> {
    let from: Mailbox = format!("{} <{}>", digest.subject, sender_email).parse()?;

    let mut builder = Message::builder().from(from).subject(digest.subject.clone());
    for recipient in recipients {
        builder = builder.to(recipient.parse()?);
    }

    Ok(builder.multipart(MultiPart::alternative_plain_html(
        digest.text.clone(),
        digest.html.clone(),
    ))?)
}

/// Deliver the digest over SMTP. Port 465 gets an implicit-TLS connection,
/// anything else STARTTLS.
pub fn send_digest(
    settings: &SmtpSettings,
    config: &EmailConfig,
    digest: &RenderedDigest,
) -> Result<()> {
    if config.recipients.is_empty() {
        return Err(DigestError::Config("no digest recipients configured".to_string()));
    }

    let message = build_message(digest, &settings.sender_email, &config.recipients)?;

    let credentials = Credentials::new(
        settings.sender_email.clone(),
        settings.sender_password.clone(),
    );
    let builder = if settings.port == 465 {
        SmtpTransport::relay(&settings.server)?
    } else {
        SmtpTransport::starttls_relay(&settings.server)?
    };
    let mailer = builder.port(settings.port).credentials(credentials).build();

    info!(
        "Sending digest to {} recipient(s) via {}:{}",
        config.recipients.len(),
        settings.server,
        settings.port
    );
    mailer.send(&message)?;
    info!("Digest sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> RenderedDigest {
        RenderedDigest {
            subject: "Daily RSS Digest".to_string(),
            html: "<html><body>hi</body></html>".to_string(),
            text: "hi".to_string(),
        }
    }

    #[test]
    fn builds_multipart_message_with_recipients() {
        let message = build_message(
            &digest(),
            "sender@example.com",
            &["a@example.com".to_string(), "b@example.com".to_string()],
        )
        .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Daily RSS Digest"));
        assert!(formatted.contains("a@example.com"));
        assert!(formatted.contains("b@example.com"));
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn rejects_bad_recipient_address() {
        let err = build_message(&digest(), "sender@example.com", &["not-an-address".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn missing_env_variable_is_a_config_error() {
        let err = require_env("FEED_DIGEST_TEST_UNSET").unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }
}
