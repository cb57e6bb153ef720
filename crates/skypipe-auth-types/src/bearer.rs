//! `Authorization: Bearer <token>` parsing.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode, header::AUTHORIZATION};

/// Reasons a bearer header is rejected. Each maps to a 401 with
/// `{"error": "<message>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerRejection {
    #[error("Authorization token missing")]
    Missing,
    #[error("token format must be 'Bearer <token>'")]
    Malformed,
}

impl IntoResponse for BearerRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Split `"Bearer <token>"` into the token part.
///
/// The scheme is matched case-insensitively; the header must consist of exactly
/// two space-separated parts and the token must be non-empty.
///
/// ```
/// use skypipe_auth_types::bearer::{split_bearer, BearerRejection};
///
/// assert_eq!(split_bearer("Bearer abc123"), Ok("abc123"));
/// assert_eq!(split_bearer("bearer abc123"), Ok("abc123"));
/// assert_eq!(split_bearer("Token abc123"), Err(BearerRejection::Malformed));
/// ```
pub fn split_bearer(header: &str) -> Result<&str, BearerRejection> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(BearerRejection::Malformed),
    }
}

/// Read the bearer token from the `Authorization` header.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<String, BearerRejection> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(BearerRejection::Missing)?
        .to_str()
        .map_err(|_| BearerRejection::Malformed)?;
    if value.is_empty() {
        return Err(BearerRejection::Missing);
    }
    split_bearer(value).map(str::to_owned)
}
