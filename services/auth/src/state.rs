use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::infra::cache::RedisResetTokenCache;
use crate::infra::captcha::Captcha;
use crate::infra::db::{DbSessionRepository, DbUserRepository, DbVerificationCodeRepository};
use crate::infra::mailer::Mailer;
use crate::infra::registry::ConnectionRegistry;
use crate::usecase::verification::VerifyPolicy;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub mailer: Mailer,
    pub captcha: Captcha,
    pub registry: ConnectionRegistry,
    pub policy: VerifyPolicy,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn code_repo(&self) -> DbVerificationCodeRepository {
        DbVerificationCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_repo(&self) -> DbSessionRepository {
        DbSessionRepository {
            db: self.db.clone(),
        }
    }

    pub fn reset_token_cache(&self) -> RedisResetTokenCache {
        RedisResetTokenCache {
            pool: self.redis.clone(),
        }
    }
}
