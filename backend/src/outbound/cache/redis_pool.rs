//! Shared bb8 pool of multiplexed Redis connections.

use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;

/// Errors raised while building the pool or checking out a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedisPoolError {
    #[error("failed to build redis pool: {message}")]
    Build { message: String },
    #[error("failed to get redis connection: {message}")]
    Checkout { message: String },
}

/// Cloneable handle to the Redis pool used by the cache adapters.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool<RedisConnectionManager>,
}

impl RedisPool {
    /// Connect to `redis_url`, for example `redis://127.0.0.1:6379/0`.
    ///
    /// # Errors
    ///
    /// Returns [`RedisPoolError::Build`] for a malformed URL or when the
    /// server cannot be reached.
    pub async fn connect(redis_url: &str, max_size: u32) -> Result<Self, RedisPoolError> {
        let manager = RedisConnectionManager::new(redis_url).map_err(|err| RedisPoolError::Build {
            message: err.to_string(),
        })?;
        let inner = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(|err| RedisPoolError::Build {
                message: err.to_string(),
            })?;
        Ok(Self { inner })
    }

    pub(crate) async fn get(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, RedisPoolError> {
        self.inner.get().await.map_err(|err| RedisPoolError::Checkout {
            message: err.to_string(),
        })
    }
}
