use anyhow::Context as _;
use serde::Deserialize;

use crate::domain::repository::CaptchaVerifier;
use crate::error::AuthServiceError;

#[derive(Deserialize)]
struct SiteVerifyResponse {
    success: bool,
}

/// reCAPTCHA-compatible `siteverify` client.
#[derive(Clone)]
pub struct HttpCaptchaVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl HttpCaptchaVerifier {
    pub fn new(secret: String, verify_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret,
            verify_url,
        }
    }
}

impl CaptchaVerifier for HttpCaptchaVerifier {
    async fn verify(&self, response: &str) -> Result<bool, AuthServiceError> {
        if response.is_empty() {
            return Ok(false);
        }
        let params = [("secret", self.secret.as_str()), ("response", response)];
        let resp = self
            .client
            .post(&self.verify_url)
            .form(&params)
            .send()
            .await
            .context("captcha siteverify request")?
            .error_for_status()
            .context("captcha siteverify status")?;
        let body: SiteVerifyResponse = resp.json().await.context("captcha siteverify body")?;
        Ok(body.success)
    }
}

/// Verifier used when no captcha secret is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledCaptcha;

impl CaptchaVerifier for DisabledCaptcha {
    async fn verify(&self, _response: &str) -> Result<bool, AuthServiceError> {
        Ok(true)
    }
}

#[derive(Clone)]
pub enum Captcha {
    Http(HttpCaptchaVerifier),
    Disabled(DisabledCaptcha),
}

impl Captcha {
    pub fn from_config(secret: Option<&str>, verify_url: &str) -> Self {
        match secret {
            Some(secret) => Self::Http(HttpCaptchaVerifier::new(
                secret.to_owned(),
                verify_url.to_owned(),
            )),
            None => Self::Disabled(DisabledCaptcha),
        }
    }
}

impl CaptchaVerifier for Captcha {
    async fn verify(&self, response: &str) -> Result<bool, AuthServiceError> {
        match self {
            Self::Http(v) => v.verify(response).await,
            Self::Disabled(v) => v.verify(response).await,
        }
    }
}
