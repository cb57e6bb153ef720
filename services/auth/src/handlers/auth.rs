use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skypipe_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};
use crate::usecase::register::{RegisterInput, RegisterUseCase};

// ── POST /api/v1/auth/register ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub plan_id: Uuid,
    #[serde(default)]
    pub captcha: String,
    pub full_name: String,
    pub phone: String,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiResponse<RegisterResponse>, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        captcha: state.captcha.clone(),
    };
    let out = usecase
        .execute(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
            plan_id: body.plan_id,
            captcha: body.captcha,
            full_name: body.full_name,
            phone: body.phone,
            gender: body.gender,
            country: body.country,
            city: body.city,
        })
        .await?;
    Ok(ApiResponse::new(
        StatusCode::CREATED,
        "user registered",
        RegisterResponse {
            user_id: out.user_id,
        },
    ))
}

// ── POST /api/v1/auth/login ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub email: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AuthServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        sender: state.mailer.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(ApiResponse::ok(
        "verification code sent",
        LoginResponse { email: out.email },
    ))
}
