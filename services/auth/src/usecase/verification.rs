use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::repository::{
    ResetTokenCache, SessionRepository, UserRepository, VerificationCodeRepository,
};
use crate::domain::secret::{generate_token, hash_token};
use crate::domain::types::{AuthUser, CodeRedemption, FailedAttempt, TokenRecord};
use crate::error::AuthServiceError;
use crate::infra::registry::{ConnectionRegistry, ServerEvent};

/// What a correct code unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPurpose {
    /// Issue an access and refresh token pair.
    Session,
    /// Issue a single-use password reset token.
    PasswordReset,
}

pub struct VerifyCodeInput {
    pub code: String,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum VerifyCodeOutput {
    Session {
        user_id: Uuid,
        access_token: String,
        refresh_token: String,
    },
    PasswordReset {
        user_id: Uuid,
        token: String,
    },
}

/// Token lifetimes and limits applied by [`VerifyCodeUseCase`].
#[derive(Debug, Clone, Copy)]
pub struct VerifyPolicy {
    pub max_attempts: u32,
    pub access_ttl: chrono::Duration,
    pub refresh_ttl: chrono::Duration,
    pub reset_ttl: std::time::Duration,
}

pub struct VerifyCodeUseCase<U, C, S, R>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    S: SessionRepository,
    R: ResetTokenCache,
{
    pub users: U,
    pub codes: C,
    pub sessions: S,
    pub reset_tokens: R,
    pub registry: ConnectionRegistry,
    pub policy: VerifyPolicy,
}

impl<U, C, S, R> VerifyCodeUseCase<U, C, S, R>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    S: SessionRepository,
    R: ResetTokenCache,
{
    pub async fn execute(
        &self,
        purpose: VerifyPurpose,
        input: VerifyCodeInput,
    ) -> Result<VerifyCodeOutput, AuthServiceError> {
        // ── 1. Resolve the account ──
        let user = self.resolve_user(&input).await?;
        if purpose == VerifyPurpose::Session && !user.status {
            return Err(AuthServiceError::AccountInactive);
        }

        // ── 2. Pending code ──
        let pending = self
            .codes
            .find_by_email(&user.email)
            .await?
            .ok_or(AuthServiceError::VerificationNotFound)?;

        // ── 3. Expiry, checked before the code itself ──
        if pending.is_expired(Utc::now()) {
            self.codes.delete(pending.id).await?;
            return Err(AuthServiceError::CodeExpired);
        }

        // ── 4. Mismatch ──
        if pending.code != input.code {
            return match self
                .codes
                .record_failed_attempt(pending.id, user.id, self.policy.max_attempts)
                .await?
            {
                FailedAttempt::Remaining(remaining) => {
                    Err(AuthServiceError::InvalidCode { remaining })
                }
                FailedAttempt::Suspended => {
                    info!(user_id = %user.id, "account suspended after failed verifications");
                    Err(AuthServiceError::AccountSuspended)
                }
            };
        }

        // ── 5. Match ──
        match purpose {
            VerifyPurpose::Session => self.start_session(pending.id, &input.code, &user).await,
            VerifyPurpose::PasswordReset => {
                self.start_password_reset(pending.id, &input.code, &user).await
            }
        }
    }

    async fn resolve_user(&self, input: &VerifyCodeInput) -> Result<AuthUser, AuthServiceError> {
        let email = input.email.as_deref().filter(|e| !e.is_empty());
        let user = match (input.user_id, email) {
            (Some(id), email) => self
                .users
                .find_by_id(id)
                .await?
                .filter(|u| email.is_none_or(|e| u.email == e)),
            (None, Some(email)) => self.users.find_by_email(email).await?,
            (None, None) => {
                return Err(AuthServiceError::Validation(
                    "email or user_id is required".to_owned(),
                ));
            }
        };
        user.ok_or(AuthServiceError::UserNotFound)
    }

    async fn start_session(
        &self,
        code_id: Uuid,
        code: &str,
        user: &AuthUser,
    ) -> Result<VerifyCodeOutput, AuthServiceError> {
        let access = TokenRecord::issue(user.id, generate_token(), self.policy.access_ttl);
        let refresh = TokenRecord::issue(user.id, generate_token(), self.policy.refresh_ttl);
        match self
            .sessions
            .start_session(code_id, code, user.id, &access, &refresh)
            .await?
        {
            CodeRedemption::Redeemed => {}
            CodeRedemption::CodeGone => return Err(AuthServiceError::VerificationNotFound),
            CodeRedemption::AccountInactive => return Err(AuthServiceError::AccountInactive),
        }

        let notified = self.registry.send(
            user.id,
            &ServerEvent::SessionStarted {
                user_id: user.id,
                at: access.created_at,
            },
        );
        info!(user_id = %user.id, notified, "session started");

        Ok(VerifyCodeOutput::Session {
            user_id: user.id,
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// The digest is cached before the code is consumed, so a cache outage
    /// leaves the code and the user's sessions untouched.
    async fn start_password_reset(
        &self,
        code_id: Uuid,
        code: &str,
        user: &AuthUser,
    ) -> Result<VerifyCodeOutput, AuthServiceError> {
        let token = generate_token();
        self.reset_tokens
            .store(user.id, &hash_token(&token), self.policy.reset_ttl)
            .await?;

        let redeemed = self
            .sessions
            .start_password_reset(code_id, code, user.id)
            .await;
        let failure = match redeemed {
            Ok(CodeRedemption::Redeemed) => None,
            Ok(_) => Some(AuthServiceError::VerificationNotFound),
            Err(e) => Some(e),
        };
        if let Some(err) = failure {
            if let Err(cleanup) = self.reset_tokens.take(user.id).await {
                warn!(user_id = %user.id, error = %cleanup, "failed to drop unused reset token");
            }
            return Err(err);
        }
        info!(user_id = %user.id, "password reset token issued");

        Ok(VerifyCodeOutput::PasswordReset {
            user_id: user.id,
            token,
        })
    }
}
