use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, SqlErr,
    TransactionError, TransactionTrait,
};
use uuid::Uuid;

use skypipe_auth_schema::{
    access_tokens, plans, refresh_tokens, user_profiles, users, verification_codes,
};

use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::domain::types::{
    AuthUser, CodeRedemption, FailedAttempt, TokenRecord, UserProfile, VerificationCode,
};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthServiceError> {
        // Soft-deleted rows still hold the unique email.
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await
            .context("count users by email")?;
        Ok(count > 0)
    }

    async fn plan_exists(&self, plan_id: Uuid) -> Result<bool, AuthServiceError> {
        let count = plans::Entity::find_by_id(plan_id)
            .count(&self.db)
            .await
            .context("count plans by id")?;
        Ok(count > 0)
    }

    async fn create_with_profile(
        &self,
        user: &AuthUser,
        profile: &UserProfile,
    ) -> Result<(), AuthServiceError> {
        let created = self
            .db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let user = user.clone();
                let profile = profile.clone();
                Box::pin(async move {
                    insert_user(txn, &user).await?;
                    insert_profile(txn, &profile).await?;
                    Ok(())
                })
            })
            .await;
        match created {
            Ok(()) => Ok(()),
            // Lost a race with another registration of the same email.
            Err(TransactionError::Transaction(e)) if is_unique_violation(&e) => {
                Err(AuthServiceError::EmailTaken)
            }
            Err(e) => Err(AuthServiceError::Internal(
                anyhow::Error::new(e).context("create user with profile"),
            )),
        }
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AuthServiceError> {
        let model = user_profiles::Entity::find()
            .filter(user_profiles::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find user profile")?;
        Ok(model.map(profile_from_model))
    }

    async fn update_password_if(
        &self,
        user_id: Uuid,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, AuthServiceError> {
        let updated = self
            .db
            .transaction::<_, bool, sea_orm::DbErr>(|txn| {
                let expected_hash = expected_hash.to_owned();
                let new_hash = new_hash.to_owned();
                Box::pin(async move {
                    let Some(user) = lock_user(txn, user_id).await? else {
                        return Ok(false);
                    };
                    if user.password != expected_hash {
                        return Ok(false);
                    }
                    write_password(txn, user, &new_hash).await?;
                    Ok(true)
                })
            })
            .await
            .context("update password")?;
        Ok(updated)
    }
}

async fn insert_user(txn: &DatabaseTransaction, user: &AuthUser) -> Result<(), sea_orm::DbErr> {
    users::ActiveModel {
        id: Set(user.id),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        password: Set(user.password_hash.clone()),
        role: Set(user.role.clone()),
        status: Set(user.status),
        plan_id: Set(user.plan_id),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
        deleted_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_profile(
    txn: &DatabaseTransaction,
    profile: &UserProfile,
) -> Result<(), sea_orm::DbErr> {
    user_profiles::ActiveModel {
        id: Set(profile.id),
        user_id: Set(profile.user_id),
        full_name: Set(profile.full_name.clone()),
        phone: Set(profile.phone.clone()),
        gender: Set(profile.gender.map(|g| g.as_str().to_owned())),
        country: Set(profile.country.clone()),
        city: Set(profile.city.clone()),
        avatar_url: Set(profile.avatar_url.clone()),
        created_at: Set(profile.created_at),
        updated_at: Set(profile.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Live user row under `SELECT ... FOR UPDATE`.
async fn lock_user(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> Result<Option<users::Model>, sea_orm::DbErr> {
    users::Entity::find_by_id(user_id)
        .filter(users::Column::DeletedAt.is_null())
        .lock_exclusive()
        .one(txn)
        .await
}

async fn write_password(
    txn: &DatabaseTransaction,
    user: users::Model,
    password_hash: &str,
) -> Result<(), sea_orm::DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.password = Set(password_hash.to_owned());
    active.updated_at = Set(Utc::now());
    active.update(txn).await?;
    Ok(())
}

fn user_from_model(model: users::Model) -> AuthUser {
    AuthUser {
        id: model.id,
        email: model.email,
        name: model.name,
        password_hash: model.password,
        role: model.role,
        status: model.status,
        plan_id: model.plan_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn profile_from_model(model: user_profiles::Model) -> UserProfile {
    UserProfile {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        phone: model.phone,
        gender: model.gender.and_then(|g| g.parse().ok()),
        country: model.country,
        city: model.city,
        avatar_url: model.avatar_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Verification code repository ──────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationCodeRepository {
    pub db: DatabaseConnection,
}

impl VerificationCodeRepository for DbVerificationCodeRepository {
    async fn replace_for_email(&self, code: &VerificationCode) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let code = code.clone();
                Box::pin(async move {
                    verification_codes::Entity::delete_many()
                        .filter(verification_codes::Column::Email.eq(code.email.as_str()))
                        .exec(txn)
                        .await?;
                    verification_codes::ActiveModel {
                        id: Set(code.id),
                        email: Set(code.email.clone()),
                        code: Set(code.code.clone()),
                        expires_at: Set(code.expires_at),
                        input_count: Set(code.input_count),
                        created_at: Set(code.created_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .context("replace verification code")?;
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<VerificationCode>, AuthServiceError> {
        let model = verification_codes::Entity::find()
            .filter(verification_codes::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find verification code by email")?;
        Ok(model.map(code_from_model))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError> {
        delete_code(&self.db, id)
            .await
            .context("delete verification code")?;
        Ok(())
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        user_id: Uuid,
        max_attempts: u32,
    ) -> Result<FailedAttempt, AuthServiceError> {
        let outcome = self
            .db
            .transaction::<_, Option<FailedAttempt>, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let Some(model) = verification_codes::Entity::find_by_id(id)
                        .lock_exclusive()
                        .one(txn)
                        .await?
                    else {
                        return Ok(None);
                    };

                    let input_count = model.input_count.saturating_add(1);
                    let used = u32::try_from(input_count).unwrap_or(u32::MAX);
                    if used >= max_attempts {
                        delete_code(txn, id).await?;
                        users::Entity::update_many()
                            .col_expr(users::Column::Status, Expr::value(false))
                            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
                            .filter(users::Column::Id.eq(user_id))
                            .exec(txn)
                            .await?;
                        return Ok(Some(FailedAttempt::Suspended));
                    }

                    let mut active: verification_codes::ActiveModel = model.into();
                    active.input_count = Set(input_count);
                    active.update(txn).await?;
                    Ok(Some(FailedAttempt::Remaining(max_attempts - used)))
                })
            })
            .await
            .context("record failed verification attempt")?;
        outcome.ok_or(AuthServiceError::VerificationNotFound)
    }
}

async fn delete_code<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), sea_orm::DbErr> {
    verification_codes::Entity::delete_by_id(id)
        .exec(conn)
        .await?;
    Ok(())
}

/// Lock the code row; `false` when it is gone or no longer holds `code`.
/// Takes the same lock as `record_failed_attempt`, so a racing wrong
/// submission and a match are serialized.
async fn lock_code(
    txn: &DatabaseTransaction,
    id: Uuid,
    code: &str,
) -> Result<bool, sea_orm::DbErr> {
    let row = verification_codes::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?;
    Ok(row.is_some_and(|row| row.code == code))
}

fn code_from_model(model: verification_codes::Model) -> VerificationCode {
    VerificationCode {
        id: model.id,
        email: model.email,
        code: model.code,
        expires_at: model.expires_at,
        input_count: model.input_count,
        created_at: model.created_at,
    }
}

// ── Session repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn start_session(
        &self,
        code_id: Uuid,
        code: &str,
        user_id: Uuid,
        access: &TokenRecord,
        refresh: &TokenRecord,
    ) -> Result<CodeRedemption, AuthServiceError> {
        let outcome = self
            .db
            .transaction::<_, CodeRedemption, sea_orm::DbErr>(|txn| {
                let code = code.to_owned();
                let access = access.clone();
                let refresh = refresh.clone();
                Box::pin(async move {
                    if !lock_code(txn, code_id, &code).await? {
                        return Ok(CodeRedemption::CodeGone);
                    }
                    let active = lock_user(txn, user_id)
                        .await?
                        .is_some_and(|user| user.status);
                    if !active {
                        return Ok(CodeRedemption::AccountInactive);
                    }
                    delete_code(txn, code_id).await?;
                    delete_tokens(txn, user_id).await?;
                    insert_access_token(txn, &access).await?;
                    insert_refresh_token(txn, &refresh).await?;
                    Ok(CodeRedemption::Redeemed)
                })
            })
            .await
            .context("start session")?;
        Ok(outcome)
    }

    async fn start_password_reset(
        &self,
        code_id: Uuid,
        code: &str,
        user_id: Uuid,
    ) -> Result<CodeRedemption, AuthServiceError> {
        let outcome = self
            .db
            .transaction::<_, CodeRedemption, sea_orm::DbErr>(|txn| {
                let code = code.to_owned();
                Box::pin(async move {
                    if !lock_code(txn, code_id, &code).await? {
                        return Ok(CodeRedemption::CodeGone);
                    }
                    delete_code(txn, code_id).await?;
                    delete_tokens(txn, user_id).await?;
                    Ok(CodeRedemption::Redeemed)
                })
            })
            .await
            .context("start password reset")?;
        Ok(outcome)
    }

    async fn rotate_access_token(
        &self,
        refresh_token: &str,
        user_id: Uuid,
        new_access: &TokenRecord,
    ) -> Result<Option<TokenRecord>, AuthServiceError> {
        let rotated = self
            .db
            .transaction::<_, Option<TokenRecord>, sea_orm::DbErr>(|txn| {
                let refresh_token = refresh_token.to_owned();
                let new_access = new_access.clone();
                Box::pin(async move {
                    let found = refresh_tokens::Entity::find()
                        .filter(refresh_tokens::Column::Token.eq(refresh_token))
                        .filter(refresh_tokens::Column::UserId.eq(user_id))
                        .filter(refresh_tokens::Column::Status.eq(true))
                        .filter(refresh_tokens::Column::ExpiresAt.gt(Utc::now()))
                        .one(txn)
                        .await?;
                    if found.is_none() {
                        return Ok(None);
                    }
                    access_tokens::Entity::delete_many()
                        .filter(access_tokens::Column::UserId.eq(user_id))
                        .exec(txn)
                        .await?;
                    insert_access_token(txn, &new_access).await?;
                    Ok(Some(new_access))
                })
            })
            .await
            .context("rotate access token")?;
        Ok(rotated)
    }

    async fn find_user_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<AuthUser>, AuthServiceError> {
        let found = access_tokens::Entity::find()
            .filter(access_tokens::Column::Token.eq(token))
            .filter(access_tokens::Column::Status.eq(true))
            .filter(access_tokens::Column::ExpiresAt.gt(Utc::now()))
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("find user by access token")?;
        Ok(found
            .and_then(|(_, user)| user)
            .filter(|user| user.deleted_at.is_none())
            .map(user_from_model))
    }

    async fn reset_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let password_hash = password_hash.to_owned();
                Box::pin(async move {
                    let user = lock_user(txn, user_id)
                        .await?
                        .ok_or_else(|| DbErr::RecordNotFound(format!("user {user_id}")))?;
                    write_password(txn, user, &password_hash).await?;
                    delete_tokens(txn, user_id).await?;
                    Ok(())
                })
            })
            .await
            .context("reset password")?;
        Ok(())
    }
}

async fn delete_tokens(txn: &DatabaseTransaction, user_id: Uuid) -> Result<(), sea_orm::DbErr> {
    access_tokens::Entity::delete_many()
        .filter(access_tokens::Column::UserId.eq(user_id))
        .exec(txn)
        .await?;
    refresh_tokens::Entity::delete_many()
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .exec(txn)
        .await?;
    Ok(())
}

async fn insert_access_token(
    txn: &DatabaseTransaction,
    record: &TokenRecord,
) -> Result<(), sea_orm::DbErr> {
    access_tokens::ActiveModel {
        id: Set(record.id),
        user_id: Set(record.user_id),
        token: Set(record.token.clone()),
        status: Set(true),
        expires_at: Set(record.expires_at),
        created_at: Set(record.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_refresh_token(
    txn: &DatabaseTransaction,
    record: &TokenRecord,
) -> Result<(), sea_orm::DbErr> {
    refresh_tokens::ActiveModel {
        id: Set(record.id),
        user_id: Set(record.user_id),
        token: Set(record.token.clone()),
        status: Set(true),
        expires_at: Set(record.expires_at),
        created_at: Set(record.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}
