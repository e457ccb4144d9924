//! Outbound mail collaborator.
//!
//! Account creation must not depend on mail delivery, so callers treat
//! every send as fire-and-forget: failures are logged, never surfaced.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use metagram_common::{AppError, AppResult, config::MailConfig};

const ACTIVATION_SUBJECT: &str = "Activation code";

/// SMTP mailer. `None` config disables sending entirely.
#[derive(Clone)]
pub struct Mailer {
    config: Option<MailConfig>,
    public_url: String,
}

impl Mailer {
    /// Create a new mailer.
    #[must_use]
    pub const fn new(config: Option<MailConfig>, public_url: String) -> Self {
        Self { config, public_url }
    }

    /// Check if mail sending is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a plain-text email.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let Some(config) = self.config.as_ref() else {
            tracing::debug!(to = %to, subject = %subject, "Mail disabled, skipping send");
            return Ok(());
        };

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid email address: {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::ExternalService(format!("SMTP relay setup failed: {e}")))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        builder
            .build()
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {e}")))?;

        tracing::debug!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }

    /// Send the account activation email.
    pub async fn send_activation(&self, to: &str, username: &str, code: &str) -> AppResult<()> {
        let body = activation_body(&self.public_url, username, code);
        self.send(to, ACTIVATION_SUBJECT, &body).await
    }
}

fn activation_body(public_url: &str, username: &str, code: &str) -> String {
    format!(
        "Hello, {username}!\nWelcome to Metagram. Please, visit next link: {}/activate/{code}",
        public_url.trim_end_matches('/')
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_body_contains_link() {
        let body = activation_body("https://metagram.example", "alice", "code123");
        assert!(body.contains("Hello, alice!"));
        assert!(body.contains("https://metagram.example/activate/code123"));
    }

    #[test]
    fn test_activation_body_trims_trailing_slash() {
        let body = activation_body("https://metagram.example/", "alice", "code123");
        assert!(body.contains("https://metagram.example/activate/code123"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_send_is_noop() {
        let mailer = Mailer::new(None, "https://metagram.example".to_string());
        assert!(!mailer.is_enabled());
        assert!(
            mailer
                .send_activation("alice@example.com", "alice", "code123")
                .await
                .is_ok()
        );
    }
}
