//! Port abstraction for idempotency markers.
//!
//! A marker is a bare key with an expiry: its presence means a mutating
//! request with that key was already accepted. Existence check and marking
//! are separate calls; a concurrent duplicate slipping between them is
//! caught by the membership store's duplicate-row constraint instead.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::IdempotencyKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency store adapters.
    pub enum IdempotencyStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "idempotency store connection failed: {message}",
        /// Command failed during execution.
        Query { message: String } => "idempotency store query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Whether an unexpired marker exists for `key`.
    async fn exists(&self, key: &IdempotencyKey) -> Result<bool, IdempotencyStoreError>;

    /// Record a marker for `key` that expires after `ttl`, overwriting any
    /// existing marker.
    async fn mark(&self, key: &IdempotencyKey, ttl: Duration) -> Result<(), IdempotencyStoreError>;
}
