use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use skypipe_core::health::{HealthStatus, readiness};

use crate::state::AppState;

/// `GET /readyz`: ping Postgres and Redis.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let db_ok = state.db.ping().await.is_ok();
    let redis_ok = state.redis.get().await.is_ok();
    if !(db_ok && redis_ok) {
        tracing::warn!(db_ok, redis_ok, "readiness probe failed");
    }
    readiness(db_ok && redis_ok)
}
