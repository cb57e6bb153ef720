use uuid::Uuid;

use crate::domain::repository::SessionRepository;
use crate::domain::secret::generate_token;
use crate::domain::types::TokenRecord;
use crate::error::AuthServiceError;

pub struct RefreshAccessTokenInput {
    pub refresh_token: String,
    /// User id the client claims to be; must own the refresh token.
    pub client_id: String,
}

#[derive(Debug)]
pub struct RefreshAccessTokenOutput {
    pub access_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Swap a live refresh token for a new access token. Older access tokens of
/// the owner stop working.
pub struct RefreshAccessTokenUseCase<S>
where
    S: SessionRepository,
{
    pub sessions: S,
    pub access_ttl: chrono::Duration,
}

impl<S> RefreshAccessTokenUseCase<S>
where
    S: SessionRepository,
{
    pub async fn execute(
        &self,
        input: RefreshAccessTokenInput,
    ) -> Result<RefreshAccessTokenOutput, AuthServiceError> {
        let user_id =
            Uuid::parse_str(&input.client_id).map_err(|_| AuthServiceError::InvalidToken)?;

        let candidate = TokenRecord::issue(user_id, generate_token(), self.access_ttl);
        let issued = self
            .sessions
            .rotate_access_token(&input.refresh_token, user_id, &candidate)
            .await?
            .ok_or(AuthServiceError::InvalidToken)?;

        Ok(RefreshAccessTokenOutput {
            access_token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
