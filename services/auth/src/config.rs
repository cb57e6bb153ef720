use std::time::Duration;

use anyhow::{Context as _, bail};

use crate::usecase::verification::VerifyPolicy;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_AUTH_PORT: u16 = 2350;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAX_OTP_ATTEMPTS: u32 = 5;
const DEFAULT_RESET_TOKEN_TTL: &str = "5m";
const DEFAULT_ACCESS_TOKEN_TTL: &str = "4h";
const DEFAULT_REFRESH_TOKEN_TTL: &str = "7d";
pub const DEFAULT_CAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// SMTP relay settings. Absent config means codes are only logged.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Auth service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PostgreSQL connection URL. `DATABASE_URL`, or composed from `DB_*`.
    pub database_url: String,
    /// Redis connection URL for the reset-token cache.
    pub redis_url: String,
    /// TCP port to listen on. Env var: `AUTH_PORT`.
    pub auth_port: u16,
    /// Run pending migrations at startup. Env var: `AUTO_MIGRATE`.
    pub auto_migrate: bool,
    pub smtp: Option<SmtpConfig>,
    /// Wrong submissions allowed before the account is suspended.
    pub max_otp_attempts: u32,
    pub reset_token_ttl: Duration,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// reCAPTCHA secret; captcha is not enforced when unset.
    pub captcha_secret: Option<String>,
    pub captcha_verify_url: String,
}

impl AuthConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => compose_database_url(&var)?,
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                port: parse_or(var("SMTP_PORT"), "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                username: var("SMTP_USER"),
                password: var("SMTP_PASS"),
                from: var("SMTP_FROM").context("SMTP_FROM is required when SMTP_HOST is set")?,
                host,
            }),
            None => None,
        };

        let max_otp_attempts = parse_or(
            var("MAX_OTP_ATTEMPTS"),
            "MAX_OTP_ATTEMPTS",
            DEFAULT_MAX_OTP_ATTEMPTS,
        )?;
        if max_otp_attempts == 0 {
            bail!("MAX_OTP_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            database_url,
            redis_url: var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_owned()),
            auth_port: parse_or(var("AUTH_PORT"), "AUTH_PORT", DEFAULT_AUTH_PORT)?,
            auto_migrate: parse_or(var("AUTO_MIGRATE"), "AUTO_MIGRATE", true)?,
            smtp,
            max_otp_attempts,
            reset_token_ttl: duration_or(
                var("RESET_TOKEN_TTL"),
                "RESET_TOKEN_TTL",
                DEFAULT_RESET_TOKEN_TTL,
            )?,
            access_token_ttl: duration_or(
                var("ACCESS_TOKEN_TTL"),
                "ACCESS_TOKEN_TTL",
                DEFAULT_ACCESS_TOKEN_TTL,
            )?,
            refresh_token_ttl: duration_or(
                var("REFRESH_TOKEN_TTL"),
                "REFRESH_TOKEN_TTL",
                DEFAULT_REFRESH_TOKEN_TTL,
            )?,
            captcha_secret: var("CAPTCHA_SECRET"),
            captcha_verify_url: var("CAPTCHA_VERIFY_URL")
                .unwrap_or_else(|| DEFAULT_CAPTCHA_VERIFY_URL.to_owned()),
        })
    }

    /// Limits and lifetimes applied when codes are verified and tokens issued.
    pub fn verify_policy(&self) -> anyhow::Result<VerifyPolicy> {
        Ok(VerifyPolicy {
            max_attempts: self.max_otp_attempts,
            access_ttl: chrono::Duration::from_std(self.access_token_ttl)
                .context("ACCESS_TOKEN_TTL out of range")?,
            refresh_ttl: chrono::Duration::from_std(self.refresh_token_ttl)
                .context("REFRESH_TOKEN_TTL out of range")?,
            reset_ttl: self.reset_token_ttl,
        })
    }
}

fn compose_database_url(var: &impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let user = var("DB_USER").context("DATABASE_URL or DB_USER must be set")?;
    let pass = var("DB_PASS").unwrap_or_default();
    let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_owned());
    let port = parse_or(var("DB_PORT"), "DB_PORT", DEFAULT_DB_PORT)?;
    let name = var("DB_NAME").context("DATABASE_URL or DB_NAME must be set")?;
    Ok(format!("postgres://{user}:{pass}@{host}:{port}/{name}"))
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.trim().parse().with_context(|| format!("invalid {key}: {v}")),
        None => Ok(default),
    }
}

fn duration_or(value: Option<String>, key: &str, default: &str) -> anyhow::Result<Duration> {
    let raw = value.unwrap_or_else(|| default.to_owned());
    humantime::parse_duration(raw.trim()).with_context(|| format!("invalid {key}: {raw}"))
}
