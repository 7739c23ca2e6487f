//! Membership use cases: the mutation command and the read-through query.
//!
//! Mutations go straight to the store and never touch the cache; readers
//! may therefore see a snapshot up to one refresh interval plus the cache
//! TTL old.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    MembershipCommand, MembershipQuery, MembershipRepository, MembershipStoreError, SegmentCache,
    SegmentCacheKey,
};
use crate::domain::{
    Error, MembershipMutationError, MembershipRequest, MembershipRequestError, MutationOutcome,
    UserId, UserSegments,
};

/// Default bound on one mutation transaction.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Domain service behind the membership command and query ports.
#[derive(Clone)]
pub struct MembershipService {
    repo: Arc<dyn MembershipRepository>,
    cache: Arc<dyn SegmentCache>,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
}

impl MembershipService {
    pub fn new(
        repo: Arc<dyn MembershipRepository>,
        cache: Arc<dyn SegmentCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            cache,
            clock,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the deadline applied to each mutation transaction.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    async fn read_store(&self, user_id: UserId) -> Result<Option<UserSegments>, Error> {
        let snapshot = self
            .repo
            .find_user_segments(user_id)
            .await
            .map_err(map_store_error)?;
        Ok(snapshot.filter(|snapshot| !snapshot.is_empty()))
    }
}

impl From<MembershipRequestError> for Error {
    fn from(err: MembershipRequestError) -> Self {
        let details = match &err {
            MembershipRequestError::Overlap { slugs } => json!({
                "code": "overlapping_segments",
                "slugs": slugs,
            }),
            MembershipRequestError::TtlOutOfRange { days } => json!({
                "field": "ttl_days",
                "code": "ttl_out_of_range",
                "value": days,
            }),
        };
        Self::invalid_request(err.to_string()).with_details(details)
    }
}

fn map_store_error(err: MembershipStoreError) -> Error {
    error!(error = %err, "membership store failure");
    Error::internal(format!("membership store error: {err}"))
}

fn map_mutation_error(err: MembershipMutationError) -> Error {
    match err {
        MembershipMutationError::SegmentsNotFound { slugs } => {
            Error::invalid_request("none of the requested segments exist").with_details(json!({
                "code": "segments_not_found",
                "slugs": slugs,
            }))
        }
        MembershipMutationError::DuplicateMembership { user_id } => {
            Error::conflict("user already belongs to a requested segment").with_details(json!({
                "code": "duplicate_membership",
                "user_id": user_id,
            }))
        }
        MembershipMutationError::Store(err) => map_store_error(err),
    }
}

#[async_trait]
impl MembershipCommand for MembershipService {
    async fn apply(&self, request: MembershipRequest) -> Result<MutationOutcome, Error> {
        let user_id = request.user_id();
        let mutation = request
            .into_mutation(self.clock.utc())
            .map_err(Error::from)?;

        let outcome = tokio::time::timeout(self.request_timeout, self.repo.apply_mutation(&mutation))
            .await
            .map_err(|_| {
                error!(%user_id, timeout = ?self.request_timeout, "membership mutation timed out");
                Error::internal("membership mutation timed out")
            })?
            .map_err(map_mutation_error)?;

        info!(
            %user_id,
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "membership mutation committed"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl MembershipQuery for MembershipService {
    async fn user_segments(&self, user_id: UserId) -> Result<Option<UserSegments>, Error> {
        let key = SegmentCacheKey::for_user(user_id);
        match self.cache.get(&key).await {
            Ok(Some(snapshot)) => return Ok(Some(snapshot).filter(|s| !s.is_empty())),
            Ok(None) => debug!(%user_id, "segment cache miss"),
            Err(err) => warn!(%user_id, error = %err, "segment cache read failed; using store"),
        }
        self.read_store(user_id).await
    }
}
