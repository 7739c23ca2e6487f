//! The TTL expiry sweep.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::ports::{MembershipStoreError, MembershipTransaction};
use crate::domain::{HistoryOperation, HistoryRecord, SegmentId, UserId};

/// What one committed sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpirySweepReport {
    pub expired_memberships: usize,
    pub affected_users: usize,
}

/// Remove every membership expiring on or before `now` and record one
/// `deleted` audit record per affected user, all stamped with `now`.
pub async fn sweep_expired<T>(
    tx: &mut T,
    now: DateTime<Utc>,
) -> Result<ExpirySweepReport, MembershipStoreError>
where
    T: MembershipTransaction + ?Sized,
{
    let expired = tx.delete_expired(now.date_naive()).await?;
    let expired_memberships = expired.len();

    let mut by_user: BTreeMap<UserId, Vec<SegmentId>> = BTreeMap::new();
    for (user_id, segment_id) in expired {
        by_user.entry(user_id).or_default().push(segment_id);
    }
    let affected_users = by_user.len();

    for (user_id, mut segment_ids) in by_user {
        segment_ids.sort_unstable();
        tx.append(&HistoryRecord {
            user_id,
            segment_ids,
            operation: HistoryOperation::Deleted,
            recorded_at: now,
        })
        .await?;
    }

    Ok(ExpirySweepReport {
        expired_memberships,
        affected_users,
    })
}
