//! JSON response envelope.
//!
//! Every response body has the shape
//! `{"status": {"code": <u16>, "message": "..."}, "data"?: ..., "error"?: "..."}`.
//! Success responses carry `data` (when there is any), error responses carry
//! a machine-readable `error` kind.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    code: u16,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T> {
    status: StatusBody<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Success response with a typed payload.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: Cow<'static, str>,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok(message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }
}

impl ApiResponse<()> {
    /// Response without a `data` field.
    pub fn message(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: StatusBody {
                code: self.status.as_u16(),
                message: &self.message,
            },
            data: self.data.as_ref(),
            error: None,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Error response: `message` is caller-facing, `kind` is a stable code.
pub fn error_response(status: StatusCode, message: &str, kind: &str) -> Response {
    let body: Envelope<'_, ()> = Envelope {
        status: StatusBody {
            code: status.as_u16(),
            message,
        },
        data: None,
        error: Some(kind),
    };
    (status, Json(body)).into_response()
}
