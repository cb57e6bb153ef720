use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use skypipe_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::handlers::extract::CurrentUser;
use crate::state::AppState;
use crate::usecase::password::{
    ChangePasswordInput, ChangePasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};

// ── POST /api/v1/auth/change-password ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AuthServiceError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(ChangePasswordInput {
            user_id: user.id,
            old_password: body.old_password,
            new_password: body.new_password,
        })
        .await?;
    Ok(ApiResponse::message(StatusCode::OK, "password updated"))
}

// ── POST /api/v1/auth/reset-password ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: Uuid,
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, AuthServiceError> {
    let usecase = ResetPasswordUseCase {
        sessions: state.session_repo(),
        reset_tokens: state.reset_token_cache(),
    };
    usecase
        .execute(ResetPasswordInput {
            user_id: body.user_id,
            token: body.token,
            new_password: body.new_password,
        })
        .await?;
    Ok(ApiResponse::message(StatusCode::OK, "password reset"))
}
