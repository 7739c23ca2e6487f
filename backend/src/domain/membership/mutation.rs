//! The add/remove membership transaction.

use tracing::debug;

use crate::domain::ports::{MembershipStoreError, MembershipTransaction};
use crate::domain::{HistoryOperation, HistoryRecord, SegmentId, UserId};

use super::MembershipMutation;

/// Failure of a membership mutation. Any variant means the transaction
/// must be rolled back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipMutationError {
    /// None of the segments to add exist.
    #[error("none of the requested segments exist: {}", .slugs.join(", "))]
    SegmentsNotFound { slugs: Vec<String> },
    /// The user already belongs to at least one segment being added.
    #[error("user {user_id} already belongs to a requested segment")]
    DuplicateMembership { user_id: UserId },
    /// The store failed.
    #[error(transparent)]
    Store(#[from] MembershipStoreError),
}

/// Segments actually changed by a committed mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub added: Vec<SegmentId>,
    /// Only memberships that existed; unknown or absent segments are not
    /// listed.
    pub removed: Vec<SegmentId>,
}

/// Apply adds, then removes, for one user inside an open transaction.
///
/// Adding resolves slugs leniently: unknown slugs are skipped, and only
/// when none resolve does the call fail with
/// [`MembershipMutationError::SegmentsNotFound`]. Removing unknown slugs or
/// absent memberships is a no-op. Each non-empty side writes one audit
/// record listing its segments.
pub async fn apply_mutation<T>(
    tx: &mut T,
    mutation: &MembershipMutation,
) -> Result<MutationOutcome, MembershipMutationError>
where
    T: MembershipTransaction + ?Sized,
{
    let user_id = mutation.user_id;
    let mut outcome = MutationOutcome::default();

    if !mutation.add.is_empty() {
        let segment_ids = tx.resolve_segment_ids(&mutation.add).await?;
        if segment_ids.is_empty() {
            return Err(MembershipMutationError::SegmentsNotFound {
                slugs: mutation.add.iter().map(ToString::to_string).collect(),
            });
        }
        if segment_ids.len() < mutation.add.len() {
            debug!(
                %user_id,
                requested = mutation.add.len(),
                resolved = segment_ids.len(),
                "skipping unknown segments on add"
            );
        }

        tx.insert_memberships(user_id, &segment_ids, mutation.alive_until)
            .await
            .map_err(|err| match err {
                MembershipStoreError::Duplicate { .. } => {
                    MembershipMutationError::DuplicateMembership { user_id }
                }
                other => MembershipMutationError::Store(other),
            })?;
        tx.append(&HistoryRecord {
            user_id,
            segment_ids: segment_ids.clone(),
            operation: HistoryOperation::Added,
            recorded_at: mutation.recorded_at,
        })
        .await?;
        outcome.added = segment_ids;
    }

    if !mutation.remove.is_empty() {
        let segment_ids = tx.resolve_segment_ids(&mutation.remove).await?;
        if !segment_ids.is_empty() {
            let removed = tx.delete_memberships(user_id, &segment_ids).await?;
            if !removed.is_empty() {
                tx.append(&HistoryRecord {
                    user_id,
                    segment_ids: removed.clone(),
                    operation: HistoryOperation::Deleted,
                    recorded_at: mutation.recorded_at,
                })
                .await?;
            }
            outcome.removed = removed;
        }
    }

    Ok(outcome)
}
