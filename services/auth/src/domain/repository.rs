#![allow(async_fn_in_trait)]

use std::time::Duration;

use uuid::Uuid;

use crate::domain::types::{
    AuthUser, CodeRedemption, FailedAttempt, TokenRecord, UserProfile, VerificationCode,
};
use crate::error::AuthServiceError;

/// Account store. Soft-deleted users are invisible to every lookup.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthServiceError>;
    async fn plan_exists(&self, plan_id: Uuid) -> Result<bool, AuthServiceError>;

    /// Insert the user and the profile in one transaction. A concurrent
    /// registration of the same email fails with `EmailTaken`.
    async fn create_with_profile(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
    ) -> Result<(), AuthServiceError>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AuthServiceError>;

    /// Store `new_hash` only if the locked row still holds `expected_hash`.
    /// `false` when the password changed in between (or the user is gone).
    async fn update_password_if(
        &self,
        user_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, AuthServiceError>;
}

/// One-time codes, at most one per email.
pub trait VerificationCodeRepository: Send + Sync {
    /// Delete every code for `code.email` and insert `code`, atomically.
    async fn replace_for_email(&self, code: &VerificationCode) -> Result<(), AuthServiceError>;

    async fn find_by_email(&self, email: &str)
    -> Result<Option<VerificationCode>, AuthServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Bump the attempt counter under a row lock. When the counter reaches
    /// `max_attempts` the code is deleted and the user is deactivated in the
    /// same transaction.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        user_id: Uuid,
        max_attempts: u32,
    ) -> Result<FailedAttempt, AuthServiceError>;
}

/// Access and refresh tokens. Every multi-row change is one transaction.
pub trait SessionRepository: Send + Sync {
    /// With the code row locked and still holding `code`, and the user
    /// still active: consume the code, drop all of the user's tokens and
    /// insert the new pair.
    async fn start_session(
        &self,
        code_id: Uuid,
        code: &str,
        user_id: Uuid,
        access: &TokenRecord,
        refresh: &TokenRecord,
    ) -> Result<CodeRedemption, AuthServiceError>;

    /// With the code row locked and still holding `code`: consume it and
    /// drop all of the user's tokens.
    async fn start_password_reset(
        &self,
        code_id: Uuid,
        code: &str,
        user_id: Uuid,
    ) -> Result<CodeRedemption, AuthServiceError>;

    /// Replace the owner's access tokens with `new_access` if `refresh_token`
    /// is a live refresh token of `user_id`. `None` when it is not.
    async fn rotate_access_token(
        &self,
        refresh_token: &str,
        user_id: Uuid,
        new_access: &TokenRecord,
    ) -> Result<Option<TokenRecord>, AuthServiceError>;

    /// Owner of an active, unexpired access token.
    async fn find_user_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError>;

    /// Set a new password hash and drop all of the user's tokens.
    async fn reset_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError>;
}

/// Short-lived store for password-reset token digests (Redis).
pub trait ResetTokenCache: Send + Sync {
    async fn store(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<(), AuthServiceError>;

    /// Read and delete in one step; a stored digest is usable once.
    async fn take(&self, user_id: Uuid) -> Result<Option<String>, AuthServiceError>;
}

/// Outbound delivery of verification codes.
pub trait NotificationSender: Send + Sync {
    async fn send_verification_code(&self, email: &str, code: &str)
    -> Result<(), AuthServiceError>;
}

/// Human check performed before registration.
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, response: &str) -> Result<bool, AuthServiceError>;
}
