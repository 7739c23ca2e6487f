//! In-memory transaction double for exercising the algorithms directly.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::ports::{AuditLog, MembershipStoreError, MembershipTransaction};
use crate::domain::{HistoryRecord, SegmentId, SegmentSlug, UserId};

#[derive(Debug, Default)]
pub(super) struct RecordingTx {
    pub segments: BTreeMap<String, SegmentId>,
    pub memberships: BTreeMap<(UserId, SegmentId), Option<NaiveDate>>,
    pub history: Vec<HistoryRecord>,
    pub fail_delete: bool,
}

impl RecordingTx {
    pub fn with_segments(slugs: &[(&str, i32)]) -> Self {
        Self {
            segments: slugs
                .iter()
                .map(|(slug, id)| ((*slug).to_owned(), SegmentId::new(*id)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn member_of(&self, user_id: UserId) -> Vec<SegmentId> {
        self.memberships
            .keys()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, segment)| *segment)
            .collect()
    }
}

#[async_trait]
impl AuditLog for RecordingTx {
    async fn append(&mut self, record: &HistoryRecord) -> Result<(), MembershipStoreError> {
        self.history.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl MembershipTransaction for RecordingTx {
    async fn resolve_segment_ids(
        &mut self,
        slugs: &[SegmentSlug],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        Ok(slugs
            .iter()
            .filter_map(|slug| self.segments.get(slug.as_ref()).copied())
            .collect())
    }

    async fn insert_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
        alive_until: Option<NaiveDate>,
    ) -> Result<(), MembershipStoreError> {
        for segment_id in segment_ids {
            if self
                .memberships
                .insert((user_id, *segment_id), alive_until)
                .is_some()
            {
                return Err(MembershipStoreError::duplicate(format!(
                    "user {user_id} segment {segment_id}"
                )));
            }
        }
        Ok(())
    }

    async fn delete_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        if self.fail_delete {
            return Err(MembershipStoreError::query("delete failed"));
        }
        Ok(segment_ids
            .iter()
            .filter(|segment_id| self.memberships.remove(&(user_id, **segment_id)).is_some())
            .copied()
            .collect())
    }

    async fn delete_expired(
        &mut self,
        cutoff: NaiveDate,
    ) -> Result<Vec<(UserId, SegmentId)>, MembershipStoreError> {
        let expired: Vec<(UserId, SegmentId)> = self
            .memberships
            .iter()
            .filter(|(_, alive_until)| alive_until.is_some_and(|date| date <= cutoff))
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            self.memberships.remove(key);
        }
        Ok(expired)
    }
}
