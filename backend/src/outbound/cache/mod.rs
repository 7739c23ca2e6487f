//! Redis adapters for the membership snapshot cache and the idempotency
//! marker store, sharing one bb8 pool.

mod redis_idempotency_store;
mod redis_pool;
mod redis_segment_cache;

pub use redis_idempotency_store::RedisIdempotencyStore;
pub use redis_pool::{RedisPool, RedisPoolError};
pub use redis_segment_cache::RedisSegmentCache;
