//! Redis-backed [`SegmentCache`]: JSON snapshots stored with `SET EX`.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands as _;
use tracing::debug;

use crate::domain::UserSegments;
use crate::domain::ports::{SegmentCache, SegmentCacheError, SegmentCacheKey};

use super::redis_pool::RedisPool;

/// Snapshot cache stored in Redis.
#[derive(Clone)]
pub struct RedisSegmentCache {
    pool: RedisPool,
}

impl RedisSegmentCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

pub(super) fn encode_snapshot(snapshot: &UserSegments) -> Result<String, SegmentCacheError> {
    serde_json::to_string(snapshot).map_err(|err| SegmentCacheError::serialization(err.to_string()))
}

pub(super) fn decode_snapshot(raw: &str) -> Result<UserSegments, SegmentCacheError> {
    serde_json::from_str(raw).map_err(|err| SegmentCacheError::serialization(err.to_string()))
}

/// Whole seconds for `SET EX`, never below one.
pub(super) fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SegmentCache for RedisSegmentCache {
    async fn get(&self, key: &SegmentCacheKey) -> Result<Option<UserSegments>, SegmentCacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| SegmentCacheError::backend(err.to_string()))?;
        let raw: Option<String> = conn
            .get(key.as_str())
            .await
            .map_err(|err| SegmentCacheError::backend(err.to_string()))?;
        match raw {
            Some(raw) => decode_snapshot(&raw).map(Some),
            None => {
                debug!(%key, "segment cache key absent");
                Ok(None)
            }
        }
    }

    async fn put(
        &self,
        key: &SegmentCacheKey,
        snapshot: &UserSegments,
        ttl: Duration,
    ) -> Result<(), SegmentCacheError> {
        let payload = encode_snapshot(snapshot)?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| SegmentCacheError::backend(err.to_string()))?;
        conn.set_ex::<_, _, ()>(key.as_str(), payload, expiry_seconds(ttl))
            .await
            .map_err(|err| SegmentCacheError::backend(err.to_string()))
    }
}
