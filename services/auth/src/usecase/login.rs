use skypipe_domain::validate::is_valid_email;

use crate::domain::repository::{NotificationSender, UserRepository, VerificationCodeRepository};
use crate::domain::secret::verify_password;
use crate::error::AuthServiceError;
use crate::usecase::otp::issue_code;

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub email: String,
}

/// Password check followed by an emailed code; tokens come from verification.
pub struct LoginUseCase<U, C, N>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    N: NotificationSender,
{
    pub users: U,
    pub codes: C,
    pub sender: N,
}

impl<U, C, N> LoginUseCase<U, C, N>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    N: NotificationSender,
{
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, AuthServiceError> {
        if !is_valid_email(&input.email) || input.password.is_empty() {
            return Err(AuthServiceError::Validation(
                "email and password are required".to_owned(),
            ));
        }

        let user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }
        if !user.status {
            return Err(AuthServiceError::AccountInactive);
        }

        issue_code(&self.codes, &self.sender, &user.email).await?;
        Ok(LoginOutput { email: user.email })
    }
}
