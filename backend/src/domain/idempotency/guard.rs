//! Exactly-once gate in front of mutating operations.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use crate::domain::Error;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError};

use super::{IdempotencyConfig, IdempotencyKey};

/// Stable `details.code` of a replay rejection.
pub const IDEMPOTENCY_KEY_REPLAYED: &str = "idempotency_key_replayed";

/// Runs a delegate at most once per idempotency key within the configured
/// TTL.
///
/// The key is marked before the delegate runs and is never released, so a
/// delegate failure still consumes the key. Clients retry a failed mutation
/// with a fresh key.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
    config: IdempotencyConfig,
}

fn map_store_error(err: IdempotencyStoreError) -> Error {
    error!(error = %err, "idempotency store unavailable");
    Error::internal(format!("idempotency store error: {err}"))
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn IdempotencyStore>, config: IdempotencyConfig) -> Self {
        Self { store, config }
    }

    /// Run `operation` unless `key` is missing or was already used.
    ///
    /// # Errors
    ///
    /// - `invalid_request` when no key was supplied.
    /// - `conflict` with `details.code = "idempotency_key_replayed"` when
    ///   the key was seen within the TTL; `operation` is not invoked.
    /// - `internal_error` when the marker store fails.
    /// - Whatever `operation` returns.
    pub async fn run<T, F, Fut>(
        &self,
        key: Option<&IdempotencyKey>,
        operation: F,
    ) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let Some(key) = key else {
            return Err(
                Error::invalid_request("Idempotency-Key header is required").with_details(json!({
                    "field": "Idempotency-Key",
                    "code": "missing_idempotency_key",
                })),
            );
        };

        if self.store.exists(key).await.map_err(map_store_error)? {
            debug!(idempotency_key = %key, "rejecting replayed idempotency key");
            return Err(
                Error::conflict("a request with this idempotency key was already processed")
                    .with_details(json!({ "code": IDEMPOTENCY_KEY_REPLAYED })),
            );
        }

        self.store
            .mark(key, self.config.ttl())
            .await
            .map_err(map_store_error)?;
        operation().await
    }
}
