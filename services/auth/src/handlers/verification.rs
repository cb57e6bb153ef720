use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skypipe_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::infra::cache::RedisResetTokenCache;
use crate::infra::db::{DbSessionRepository, DbUserRepository, DbVerificationCodeRepository};
use crate::state::AppState;
use crate::usecase::otp::{IssueOtpInput, IssueOtpUseCase};
use crate::usecase::verification::{
    VerifyCodeInput, VerifyCodeOutput, VerifyCodeUseCase, VerifyPurpose,
};

type DbVerifyCodeUseCase = VerifyCodeUseCase<
    DbUserRepository,
    DbVerificationCodeRepository,
    DbSessionRepository,
    RedisResetTokenCache,
>;

fn verify_usecase(state: &AppState) -> DbVerifyCodeUseCase {
    VerifyCodeUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        sessions: state.session_repo(),
        reset_tokens: state.reset_token_cache(),
        registry: state.registry.clone(),
        policy: state.policy,
    }
}

fn unexpected(out: VerifyCodeOutput) -> AuthServiceError {
    AuthServiceError::Internal(anyhow::anyhow!("unexpected verification outcome: {out:?}"))
}

// ── POST /api/v1/auth/verifications ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub code: String,
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SessionTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<ApiResponse<SessionTokensResponse>, AuthServiceError> {
    let out = verify_usecase(&state)
        .execute(
            VerifyPurpose::Session,
            VerifyCodeInput {
                code: body.code,
                email: body.email,
                user_id: body.user_id,
            },
        )
        .await?;
    match out {
        VerifyCodeOutput::Session {
            access_token,
            refresh_token,
            ..
        } => Ok(ApiResponse::ok(
            "verification successful",
            SessionTokensResponse {
                access_token,
                refresh_token,
            },
        )),
        other => Err(unexpected(other)),
    }
}

// ── POST /api/v1/auth/forgot-password ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse<()>, AuthServiceError> {
    let usecase = IssueOtpUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        sender: state.mailer.clone(),
    };
    usecase.execute(IssueOtpInput { email: body.email }).await?;
    Ok(ApiResponse::message(StatusCode::OK, "verification code sent"))
}

// ── POST /api/v1/auth/confirm-forgot-password ─────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmForgotPasswordRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct ResetTokenResponse {
    pub token: String,
    pub user_id: Uuid,
}

pub async fn confirm_forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ConfirmForgotPasswordRequest>,
) -> Result<ApiResponse<ResetTokenResponse>, AuthServiceError> {
    let out = verify_usecase(&state)
        .execute(
            VerifyPurpose::PasswordReset,
            VerifyCodeInput {
                code: body.code,
                email: Some(body.email),
                user_id: None,
            },
        )
        .await?;
    match out {
        VerifyCodeOutput::PasswordReset { user_id, token } => Ok(ApiResponse::ok(
            "verification successful",
            ResetTokenResponse { token, user_id },
        )),
        other => Err(unexpected(other)),
    }
}
