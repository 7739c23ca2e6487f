//! Redis-backed [`IdempotencyStore`]: one expiring key per marker.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands as _;

use crate::domain::IdempotencyKey;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};

use super::redis_pool::RedisPool;
use super::redis_segment_cache::expiry_seconds;

const MARKER_PREFIX: &str = "idempotency:";

/// Marker store kept in Redis.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    pool: RedisPool,
}

impl RedisIdempotencyStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

fn marker_key(key: &IdempotencyKey) -> String {
    format!("{MARKER_PREFIX}{}", key.as_ref())
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, IdempotencyStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| IdempotencyStoreError::connection(err.to_string()))?;
        conn.exists::<_, bool>(marker_key(key))
            .await
            .map_err(|err| IdempotencyStoreError::query(err.to_string()))
    }

    async fn mark(&self, key: &IdempotencyKey, ttl: Duration) -> Result<(), IdempotencyStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| IdempotencyStoreError::connection(err.to_string()))?;
        conn.set_ex::<_, _, ()>(marker_key(key), "1", expiry_seconds(ttl))
            .await
            .map_err(|err| IdempotencyStoreError::query(err.to_string()))
    }
}
