use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::{AuthUser, UserProfile};
use crate::error::AuthServiceError;

#[derive(Debug)]
pub struct Me {
    pub user: AuthUser,
    pub profile: Option<UserProfile>,
}

pub struct GetMeUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> GetMeUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, user_id: Uuid) -> Result<Me, AuthServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;
        let profile = self.users.find_profile(user.id).await?;
        Ok(Me { user, profile })
    }
}
