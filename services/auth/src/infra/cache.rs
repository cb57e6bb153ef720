use std::time::Duration;

use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use uuid::Uuid;

use crate::domain::repository::ResetTokenCache;
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct RedisResetTokenCache {
    pub pool: Pool,
}

fn reset_token_key(user_id: Uuid) -> String {
    format!("reset_token:{}", user_id)
}

impl ResetTokenCache for RedisResetTokenCache {
    async fn store(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<(), AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let key = reset_token_key(user_id);
        // SET EX rejects 0; sub-second TTLs round up.
        let secs = ttl.as_secs().max(1);
        let (): () = conn
            .set_ex(&key, token_hash, secs)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }

    async fn take(&self, user_id: Uuid) -> Result<Option<String>, AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let key = reset_token_key(user_id);
        let value: Option<String> = conn
            .get_del(&key)
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        Ok(value)
    }
}
