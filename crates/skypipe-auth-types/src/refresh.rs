//! Refresh-token request headers.
//!
//! Clients renew an access token by sending the refresh token as
//! `x-rtoken-id: Bearer <refresh token>` together with their user id in
//! `x-client-id`.

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::request::Parts;

use skypipe_core::response::error_response;

use crate::bearer::split_bearer;

pub const X_RTOKEN_ID: &str = "x-rtoken-id";
pub const X_CLIENT_ID: &str = "x-client-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RefreshHeaderRejection {
    #[error("missing token or client id on header")]
    Missing,
    #[error("invalid token header format")]
    Malformed,
}

impl RefreshHeaderRejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Missing => "MISSING_REFRESH_HEADERS",
            Self::Malformed => "INVALID_REFRESH_HEADER",
        }
    }
}

impl IntoResponse for RefreshHeaderRejection {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, &self.to_string(), self.kind())
    }
}

/// Refresh token and client id taken from the request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshHeaders {
    pub refresh_token: String,
    pub client_id: String,
}

impl<S> FromRequestParts<S> for RefreshHeaders
where
    S: Send + Sync,
{
    type Rejection = RefreshHeaderRejection;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let rtoken = header(X_RTOKEN_ID);
        let client_id = header(X_CLIENT_ID);

        async move {
            let (Some(rtoken), Some(client_id)) = (rtoken, client_id) else {
                return Err(RefreshHeaderRejection::Missing);
            };
            let refresh_token = split_bearer(&rtoken)
                .map_err(|_| RefreshHeaderRejection::Malformed)?
                .to_owned();
            Ok(Self {
                refresh_token,
                client_id,
            })
        }
    }
}
