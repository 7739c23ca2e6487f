//! Operations available inside one membership store transaction.
//!
//! Adapters hand an implementation of [`MembershipTransaction`] to the
//! domain algorithms in [`crate::domain::membership`] after opening a
//! transaction, and commit only if the algorithm returns `Ok`. Every method
//! therefore runs against uncommitted state and must not commit on its own.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{HistoryRecord, SegmentId, SegmentSlug, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by membership store adapters.
    pub enum MembershipStoreError {
        /// Store connection could not be established or was lost.
        Connection { message: String } => "membership store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "membership store query failed: {message}",
        /// An insert collided with an existing `(user_id, segment_id)` row.
        Duplicate { message: String } => "membership already exists: {message}",
    }
}

/// Append-only writer of audit records.
///
/// Records are written through the same transaction as the change they
/// describe.
#[async_trait]
pub trait AuditLog: Send {
    /// Append one record, stored as one row per affected segment.
    async fn append(&mut self, record: &HistoryRecord) -> Result<(), MembershipStoreError>;
}

/// Membership reads and writes scoped to an open transaction.
#[async_trait]
pub trait MembershipTransaction: AuditLog {
    /// Resolve slugs to segment identifiers. Unknown slugs are skipped, so
    /// the result may be shorter than the input or empty.
    async fn resolve_segment_ids(
        &mut self,
        slugs: &[SegmentSlug],
    ) -> Result<Vec<SegmentId>, MembershipStoreError>;

    /// Insert one membership row per segment, all sharing `alive_until`.
    ///
    /// Must fail with [`MembershipStoreError::Duplicate`] when any row
    /// already exists.
    async fn insert_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
        alive_until: Option<NaiveDate>,
    ) -> Result<(), MembershipStoreError>;

    /// Delete the user's memberships in the given segments and return the
    /// identifiers of rows that actually existed.
    async fn delete_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
    ) -> Result<Vec<SegmentId>, MembershipStoreError>;

    /// Delete every membership whose `alive_until` is on or before `cutoff`
    /// and return the removed pairs.
    async fn delete_expired(
        &mut self,
        cutoff: NaiveDate,
    ) -> Result<Vec<(UserId, SegmentId)>, MembershipStoreError>;
}
