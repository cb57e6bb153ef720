use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use skypipe_auth_types::refresh::RefreshHeaders;
use skypipe_core::response::ApiResponse;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::token::{RefreshAccessTokenInput, RefreshAccessTokenUseCase};

// ── POST /api/v1/auth/refresh-access-token ────────────────────────────────────

#[derive(Serialize)]
pub struct RefreshAccessTokenResponse {
    pub access_token: String,
    #[serde(serialize_with = "skypipe_core::serde::to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn refresh_access_token(
    State(state): State<AppState>,
    headers: RefreshHeaders,
) -> Result<ApiResponse<RefreshAccessTokenResponse>, AuthServiceError> {
    let usecase = RefreshAccessTokenUseCase {
        sessions: state.session_repo(),
        access_ttl: state.policy.access_ttl,
    };
    let out = usecase
        .execute(RefreshAccessTokenInput {
            refresh_token: headers.refresh_token,
            client_id: headers.client_id,
        })
        .await?;
    Ok(ApiResponse::ok(
        "access token refreshed",
        RefreshAccessTokenResponse {
            access_token: out.access_token,
            expires_at: out.expires_at,
        },
    ))
}
