//! Port interface for the per-user membership snapshot cache.
//!
//! The cache is never authoritative. Readers fall back to the membership
//! store on a miss or a backend error, and writers tolerate lost updates.
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::UserSegments;

use super::{SegmentCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum SegmentCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "segment cache backend failure: {message}",
        /// Serialisation or deserialisation of cached content failed.
        Serialization { message: String } => "segment cache serialisation failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentCache: Send + Sync {
    /// Read a cached snapshot for the given key.
    async fn get(&self, key: &SegmentCacheKey) -> Result<Option<UserSegments>, SegmentCacheError>;

    /// Store a snapshot under `key`, expiring after `ttl`.
    async fn put(
        &self,
        key: &SegmentCacheKey,
        snapshot: &UserSegments,
        ttl: Duration,
    ) -> Result<(), SegmentCacheError>;
}
