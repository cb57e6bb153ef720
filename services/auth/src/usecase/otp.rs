use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repository::{NotificationSender, UserRepository, VerificationCodeRepository};
use crate::domain::secret::generate_otp;
use crate::domain::types::{OTP_TTL_SECS, VerificationCode};
use crate::error::AuthServiceError;

/// Replace any pending code for `email` with a fresh one and mail it.
///
/// If delivery fails the new row is deleted again, so the caller can retry
/// without leaving an undelivered code behind.
pub async fn issue_code<C, N>(codes: &C, sender: &N, email: &str) -> Result<(), AuthServiceError>
where
    C: VerificationCodeRepository,
    N: NotificationSender,
{
    let now = Utc::now();
    let code = VerificationCode {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        code: generate_otp(),
        expires_at: now + Duration::seconds(OTP_TTL_SECS),
        input_count: 0,
        created_at: now,
    };
    codes.replace_for_email(&code).await?;

    if let Err(e) = sender.send_verification_code(email, &code.code).await {
        if let Err(cleanup) = codes.delete(code.id).await {
            warn!(error = %cleanup, code_id = %code.id, "failed to drop undelivered code");
        }
        return Err(e);
    }

    info!(code_id = %code.id, expires_at = %code.expires_at, "verification code issued");
    Ok(())
}

pub struct IssueOtpInput {
    pub email: String,
}

/// Issue a code to a known account (forgot-password entry point).
pub struct IssueOtpUseCase<U, C, N>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    N: NotificationSender,
{
    pub users: U,
    pub codes: C,
    pub sender: N,
}

impl<U, C, N> IssueOtpUseCase<U, C, N>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    N: NotificationSender,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<(), AuthServiceError> {
        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        issue_code(&self.codes, &self.sender, &user.email).await
    }
}
