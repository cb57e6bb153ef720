use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use skypipe_auth_types::bearer::{BearerRejection, bearer_from_headers};

use crate::domain::repository::SessionRepository;
use crate::domain::types::AuthUser;
use crate::error::AuthServiceError;
use crate::state::AppState;

/// Why a request could not be tied to a user.
#[derive(Debug)]
pub enum AuthRejection {
    Bearer(BearerRejection),
    /// Unknown, revoked or expired access token.
    InvalidToken,
    Service(AuthServiceError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Bearer(rejection) => rejection.into_response(),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Invalid token" })),
            )
                .into_response(),
            Self::Service(e) => e.into_response(),
        }
    }
}

/// Resolve a raw access token to its owner.
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AuthRejection> {
    state
        .session_repo()
        .find_user_by_access_token(token)
        .await
        .map_err(AuthRejection::Service)?
        .ok_or(AuthRejection::InvalidToken)
}

/// The user behind `Authorization: Bearer <access token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_from_headers(&parts.headers).map_err(AuthRejection::Bearer)?;
        authenticate(state, &token).await.map(Self)
    }
}
