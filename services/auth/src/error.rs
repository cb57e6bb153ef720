use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use skypipe_core::response::error_response;

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("user not found")]
    UserNotFound,
    #[error("no pending verification")]
    VerificationNotFound,
    #[error("invalid plan")]
    InvalidPlan,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("old password is incorrect")]
    PasswordMismatch,
    #[error("captcha verification failed")]
    CaptchaFailed,
    #[error("account suspended")]
    AccountInactive,
    #[error("email already registered")]
    EmailTaken,
    #[error("verification code expired")]
    CodeExpired,
    #[error("invalid code. You have {remaining} attempt(s) remaining")]
    InvalidCode { remaining: u32 },
    #[error("Too many failed attempts; your account has been suspended. Please contact support")]
    AccountSuspended,
    #[error("failed to send verification code")]
    Delivery(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::VerificationNotFound => "VERIFICATION_NOT_FOUND",
            Self::InvalidPlan => "INVALID_PLAN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::CaptchaFailed => "CAPTCHA_FAILED",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::InvalidCode { .. } => "INVALID_CODE",
            Self::AccountSuspended => "ACCOUNT_SUSPENDED",
            Self::Delivery(_) => "DELIVERY",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::VerificationNotFound
            | Self::InvalidPlan
            | Self::CodeExpired
            | Self::InvalidCode { .. }
            | Self::AccountSuspended => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::InvalidToken | Self::PasswordMismatch => {
                StatusCode::UNAUTHORIZED
            }
            Self::CaptchaFailed | Self::AccountInactive => StatusCode::FORBIDDEN,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Delivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        // 4xx are expected client errors and already show up in the TraceLayer span.
        match &self {
            Self::Delivery(e) | Self::Internal(e) => {
                tracing::error!(error = format!("{e:#}"), kind = self.kind(), "internal error");
            }
            _ => {}
        }
        error_response(self.status(), &self.to_string(), self.kind())
    }
}
