//! Captcha verification collaborator.
//!
//! Registration is gated on an external captcha check. The core only
//! depends on the [`CaptchaVerifier`] trait; a reCAPTCHA `siteverify`
//! client and a no-op verifier are provided.

use std::sync::Arc;

use async_trait::async_trait;
use metagram_common::{AppError, AppResult, config::CaptchaConfig};
use serde::Deserialize;

/// Captcha verifier trait.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// Verify a captcha response token. `Ok(false)` means the challenge
    /// was not passed; errors are reserved for transport failures.
    async fn verify(&self, response_token: &str) -> AppResult<bool>;
}

/// Shared handle to a captcha verifier.
pub type CaptchaService = Arc<dyn CaptchaVerifier>;

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
}

/// reCAPTCHA `siteverify` client.
pub struct RecaptchaVerifier {
    secret: String,
    verify_url: String,
    http_client: reqwest::Client,
}

impl RecaptchaVerifier {
    /// Create a new reCAPTCHA verifier.
    #[must_use]
    pub fn new(config: &CaptchaConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            verify_url: config.verify_url.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, response_token: &str) -> AppResult<bool> {
        if response_token.is_empty() {
            return Ok(false);
        }

        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&[
                ("secret", self.secret.as_str()),
                ("response", response_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Captcha request failed: {e}")))?;

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Captcha response invalid: {e}")))?;

        Ok(body.success)
    }
}

/// No-op captcha verifier for tests or captcha-disabled deployments.
#[derive(Clone, Default)]
pub struct NoOpCaptcha;

#[async_trait]
impl CaptchaVerifier for NoOpCaptcha {
    async fn verify(&self, _response_token: &str) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_captcha_always_passes() {
        let verifier = NoOpCaptcha;
        assert!(verifier.verify("anything").await.unwrap());
        assert!(verifier.verify("").await.unwrap());
    }

    #[tokio::test]
    async fn test_recaptcha_rejects_empty_token_without_request() {
        let verifier = RecaptchaVerifier::new(&CaptchaConfig {
            secret: "secret".to_string(),
            verify_url: "http://localhost:1/siteverify".to_string(),
        });
        // Empty tokens short-circuit; no request is made
        assert!(!verifier.verify("").await.unwrap());
    }

    #[test]
    fn test_site_verify_response_parsing() {
        let body: SiteVerifyResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(body.success);

        let body: SiteVerifyResponse =
            serde_json::from_str(r#"{"success": false, "error-codes": ["timeout-or-duplicate"]}"#)
                .unwrap();
        assert!(!body.success);
    }
}
