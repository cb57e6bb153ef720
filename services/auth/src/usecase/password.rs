use tracing::info;
use uuid::Uuid;

use skypipe_domain::validate::{MIN_PASSWORD_LEN, is_valid_password};

use crate::domain::repository::{ResetTokenCache, SessionRepository, UserRepository};
use crate::domain::secret::{hash_password, hash_token, verify_password};
use crate::error::AuthServiceError;

fn check_new_password(password: &str) -> Result<(), AuthServiceError> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(AuthServiceError::Validation(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters"
        )))
    }
}

// ── Change password (authenticated) ──────────────────────────────────────────

pub struct ChangePasswordInput {
    pub user_id: Uuid,
    pub old_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: ChangePasswordInput) -> Result<(), AuthServiceError> {
        check_new_password(&input.new_password)?;

        let user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !verify_password(&input.old_password, &user.password_hash)? {
            return Err(AuthServiceError::PasswordMismatch);
        }

        let hash = hash_password(&input.new_password)?;
        // The row is written only if it still holds the hash verified above.
        if !self
            .users
            .update_password_if(user.id, &user.password_hash, &hash)
            .await?
        {
            return Err(AuthServiceError::PasswordMismatch);
        }
        info!(user_id = %user.id, "password changed");
        Ok(())
    }
}

// ── Reset password (after a verified code) ───────────────────────────────────

pub struct ResetPasswordInput {
    pub user_id: Uuid,
    pub token: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<S, R>
where
    S: SessionRepository,
    R: ResetTokenCache,
{
    pub sessions: S,
    pub reset_tokens: R,
}

impl<S, R> ResetPasswordUseCase<S, R>
where
    S: SessionRepository,
    R: ResetTokenCache,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), AuthServiceError> {
        check_new_password(&input.new_password)?;

        // Taken before comparing: a wrong guess burns the token too.
        let stored = self
            .reset_tokens
            .take(input.user_id)
            .await?
            .ok_or(AuthServiceError::InvalidToken)?;
        if stored != hash_token(&input.token) {
            return Err(AuthServiceError::InvalidToken);
        }

        let hash = hash_password(&input.new_password)?;
        self.sessions.reset_password(input.user_id, &hash).await?;
        info!(user_id = %input.user_id, "password reset");
        Ok(())
    }
}
