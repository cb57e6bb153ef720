use axum::{
    Router,
    routing::{get, post},
};

use skypipe_core::health::healthz;
use skypipe_core::middleware::with_http_layers;

use crate::handlers::{
    auth::{login, register},
    health::readyz,
    password::{change_password, reset_password},
    token::refresh_access_token,
    user::get_me,
    verification::{confirm_forgot_password, forgot_password, verify},
    ws::ws_handler,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Sign-up and login
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/verifications", post(verify))
        // Tokens
        .route(
            "/api/v1/auth/refresh-access-token",
            post(refresh_access_token),
        )
        // Passwords
        .route("/api/v1/auth/forgot-password", post(forgot_password))
        .route(
            "/api/v1/auth/confirm-forgot-password",
            post(confirm_forgot_password),
        )
        .route("/api/v1/auth/reset-password", post(reset_password))
        .route("/api/v1/auth/change-password", post(change_password))
        // Users
        .route("/api/v1/users/me", get(get_me))
        // Notifications
        .route("/ws", get(ws_handler))
        .with_state(state);
    with_http_layers(router)
}
