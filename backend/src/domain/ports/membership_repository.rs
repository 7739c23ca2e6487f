//! Port for the transactional membership store.
//!
//! Each write method runs in its own store transaction: either everything it
//! does (membership rows and audit records) commits, or nothing does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ExpirySweepReport, MembershipMutation, MembershipMutationError, MutationOutcome, UserId,
    UserSegments,
};

use super::MembershipStoreError;

/// Source of truth for user to segment memberships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Apply adds then removes for one user atomically, writing audit
    /// records alongside.
    async fn apply_mutation(
        &self,
        mutation: &MembershipMutation,
    ) -> Result<MutationOutcome, MembershipMutationError>;

    /// Delete memberships that expired on or before `now`, writing one audit
    /// record per affected user, in a single transaction.
    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ExpirySweepReport, MembershipStoreError>;

    /// Current memberships of a user, or `None` when there are none.
    async fn find_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSegments>, MembershipStoreError>;

    /// Users holding at least one membership row.
    async fn list_member_user_ids(&self) -> Result<Vec<UserId>, MembershipStoreError>;
}
