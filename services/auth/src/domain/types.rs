use chrono::{DateTime, Utc};
use uuid::Uuid;

use skypipe_domain::user::Gender;

/// Account record as seen by the auth workflow.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    /// `false` once the account is suspended.
    pub status: bool,
    pub plan_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact details captured at registration.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One-time numeric code sent by email.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub input_count: i32,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Outcome of recording a wrong code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAttempt {
    /// The code is still usable this many more times.
    Remaining(u32),
    /// The attempt limit was reached: the code is gone and the account is inactive.
    Suspended,
}

/// Outcome of consuming a matched code inside the session transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRedemption {
    Redeemed,
    /// The row was deleted or replaced after it was read.
    CodeGone,
    /// The account was suspended; nothing was written.
    AccountInactive,
}

/// Opaque access or refresh token row.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn issue(user_id: Uuid, token: String, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: now + ttl,
            created_at: now,
        }
    }
}

/// OTP length in digits.
pub const OTP_LEN: usize = 6;

/// OTP time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 180;

/// Random bytes per opaque token (hex-encoded to twice as many chars).
pub const TOKEN_BYTES: usize = 32;

/// bcrypt cost factor.
pub const BCRYPT_COST: u32 = 10;
