//! In-process [`SegmentCache`] with per-entry expiry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::UserSegments;
use crate::domain::ports::{SegmentCache, SegmentCacheError, SegmentCacheKey};

/// Snapshot cache held in a map; expired entries read as misses.
#[derive(Debug, Default)]
pub struct MemorySegmentCache {
    entries: Mutex<HashMap<SegmentCacheKey, (UserSegments, Instant)>>,
}

impl MemorySegmentCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> SegmentCacheError {
    SegmentCacheError::backend("memory cache lock poisoned")
}

#[async_trait]
impl SegmentCache for MemorySegmentCache {
    async fn get(&self, key: &SegmentCacheKey) -> Result<Option<UserSegments>, SegmentCacheError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        match entries.get(key) {
            Some((snapshot, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(snapshot.clone()))
            }
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &SegmentCacheKey,
        snapshot: &UserSegments,
        ttl: Duration,
    ) -> Result<(), SegmentCacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| SegmentCacheError::backend(format!("ttl {ttl:?} out of range")))?;
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.clone(), (snapshot.clone(), expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::UserId;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemorySegmentCache::new();
        let user = UserId::new(1).expect("positive id");
        let key = SegmentCacheKey::for_user(user);
        cache
            .put(&key, &UserSegments::new(user, Vec::new()), Duration::from_secs(300))
            .await
            .expect("put succeeds");

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get(&key).await.expect("get succeeds").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key).await.expect("get succeeds").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn unrepresentable_ttl_is_a_backend_error() {
        let cache = MemorySegmentCache::new();
        let user = UserId::new(2).expect("positive id");
        let key = SegmentCacheKey::for_user(user);

        let err = cache
            .put(
                &key,
                &UserSegments::new(user, Vec::new()),
                Duration::from_secs(u64::MAX / 2),
            )
            .await
            .expect_err("ttl overflows the clock");

        assert!(matches!(err, SegmentCacheError::Backend { .. }));
        assert!(cache.get(&key).await.expect("get succeeds").is_none());
    }
}
