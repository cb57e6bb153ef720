use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use skypipe_core::response::ApiResponse;
use skypipe_domain::user::Gender;

use crate::domain::types::UserProfile;
use crate::error::AuthServiceError;
use crate::handlers::extract::CurrentUser;
use crate::state::AppState;
use crate::usecase::user::GetMeUseCase;

// ── GET /api/v1/users/me ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub full_name: String,
    pub phone: String,
    pub gender: Option<Gender>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            full_name: p.full_name,
            phone: p.phone,
            gender: p.gender,
            country: p.country,
            city: p.city,
            avatar_url: p.avatar_url,
        }
    }
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub status: bool,
    pub plan_id: Option<Uuid>,
    #[serde(serialize_with = "skypipe_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    pub profile: Option<ProfileResponse>,
}

pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<ApiResponse<MeResponse>, AuthServiceError> {
    let usecase = GetMeUseCase {
        users: state.user_repo(),
    };
    let me = usecase.execute(user.id).await?;
    Ok(ApiResponse::ok(
        "ok",
        MeResponse {
            id: me.user.id,
            email: me.user.email,
            name: me.user.name,
            role: me.user.role,
            status: me.user.status,
            plan_id: me.user.plan_id,
            created_at: me.user.created_at,
            profile: me.profile.map(ProfileResponse::from),
        },
    ))
}
