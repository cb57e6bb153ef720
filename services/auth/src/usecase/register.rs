use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use skypipe_domain::user::{DEFAULT_ROLE, Gender};
use skypipe_domain::validate::{
    MIN_NAME_LEN, MIN_PASSWORD_LEN, MIN_PHONE_LEN, is_valid_email, is_valid_name,
    is_valid_password, is_valid_phone,
};

use crate::domain::repository::{CaptchaVerifier, UserRepository};
use crate::domain::secret::hash_password;
use crate::domain::types::{AuthUser, UserProfile};
use crate::error::AuthServiceError;

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub plan_id: Uuid,
    pub captcha: String,
    pub full_name: String,
    pub phone: String,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub user_id: Uuid,
}

pub struct RegisterUseCase<U, V>
where
    U: UserRepository,
    V: CaptchaVerifier,
{
    pub users: U,
    pub captcha: V,
}

impl<U, V> RegisterUseCase<U, V>
where
    U: UserRepository,
    V: CaptchaVerifier,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<RegisterOutput, AuthServiceError> {
        let gender = validate(&input)?;

        if !self.captcha.verify(&input.captcha).await? {
            return Err(AuthServiceError::CaptchaFailed);
        }

        if self.users.exists_by_email(&input.email).await? {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = hash_password(&input.password)?;

        if !self.users.plan_exists(input.plan_id).await? {
            return Err(AuthServiceError::InvalidPlan);
        }

        let now = Utc::now();
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name.trim().to_owned(),
            password_hash,
            role: DEFAULT_ROLE.to_owned(),
            status: true,
            plan_id: Some(input.plan_id),
            created_at: now,
            updated_at: now,
        };
        let profile = UserProfile {
            id: Uuid::new_v4(),
            user_id: user.id,
            full_name: input.full_name.trim().to_owned(),
            phone: input.phone.trim().to_owned(),
            gender,
            country: input.country,
            city: input.city,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };

        self.users.create_with_profile(&user, &profile).await?;
        info!(user_id = %user.id, plan_id = %input.plan_id, "user registered");
        Ok(RegisterOutput { user_id: user.id })
    }
}

fn validate(input: &RegisterInput) -> Result<Option<Gender>, AuthServiceError> {
    let invalid = |msg: String| Err(AuthServiceError::Validation(msg));
    if !is_valid_name(&input.name) {
        return invalid(format!("name must be at least {MIN_NAME_LEN} characters"));
    }
    if !is_valid_email(&input.email) {
        return invalid("invalid email address".to_owned());
    }
    if !is_valid_password(&input.password) {
        return invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if !is_valid_name(&input.full_name) {
        return invalid(format!(
            "full name must be at least {MIN_NAME_LEN} characters"
        ));
    }
    if !is_valid_phone(&input.phone) {
        return invalid(format!("phone must be at least {MIN_PHONE_LEN} digits"));
    }
    match input.gender.as_deref().filter(|g| !g.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            AuthServiceError::Validation("gender must be Male, Female or Other".to_owned())
        }),
    }
}
