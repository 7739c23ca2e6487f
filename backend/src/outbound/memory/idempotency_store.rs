//! In-process [`IdempotencyStore`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::domain::IdempotencyKey;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};

/// Marker set held in a map; expired markers read as absent.
#[derive(Debug, Default)]
pub struct MemoryIdempotencyStore {
    markers: Mutex<HashMap<IdempotencyKey, Instant>>,
}

impl MemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> IdempotencyStoreError {
    IdempotencyStoreError::query("memory marker lock poisoned")
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, IdempotencyStoreError> {
        let mut markers = self.markers.lock().map_err(poisoned)?;
        let now = Instant::now();
        markers.retain(|_, expires_at| *expires_at > now);
        Ok(markers.contains_key(key))
    }

    async fn mark(&self, key: &IdempotencyKey, ttl: Duration) -> Result<(), IdempotencyStoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| IdempotencyStoreError::query(format!("ttl {ttl:?} out of range")))?;
        let mut markers = self.markers.lock().map_err(poisoned)?;
        markers.insert(key.clone(), expires_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn marker_blocks_until_ttl_elapses() {
        let store = MemoryIdempotencyStore::new();
        let key = IdempotencyKey::new("k-1").expect("valid key");
        assert!(!store.exists(&key).await.expect("exists"));

        store
            .mark(&key, Duration::from_secs(3600))
            .await
            .expect("mark");
        assert!(store.exists(&key).await.expect("exists"));

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!store.exists(&key).await.expect("exists"));
    }

    #[rstest]
    #[tokio::test]
    async fn unrepresentable_ttl_is_rejected_without_marking() {
        let store = MemoryIdempotencyStore::new();
        let key = IdempotencyKey::new("k-2").expect("valid key");

        let err = store
            .mark(&key, Duration::MAX)
            .await
            .expect_err("ttl overflows the clock");

        assert!(matches!(err, IdempotencyStoreError::Query { .. }));
        assert!(!store.exists(&key).await.expect("exists"));
    }
}
