//! Driving port for membership mutations.
//!
//! Inbound adapters call this once a request has passed the idempotency
//! guard and field validation.

use async_trait::async_trait;

use crate::domain::{Error, MembershipRequest, MutationOutcome};

/// Domain use-case port for adding and removing a user's memberships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipCommand: Send + Sync {
    /// Apply the request as one atomic change.
    ///
    /// Fails with `invalid_request` (`segments_not_found`) when none of the
    /// segments to add exist, and `conflict` (`duplicate_membership`) when
    /// the user already belongs to one of them.
    async fn apply(&self, request: MembershipRequest) -> Result<MutationOutcome, Error>;
}
