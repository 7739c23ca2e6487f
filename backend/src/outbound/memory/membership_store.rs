//! In-process membership store.
//!
//! Transactions mutate memberships in place under the store lock and keep an
//! undo log. Audit rows are buffered and appended to the history only on
//! commit, while a failed transaction replays its undo log. This gives the
//! same all-or-nothing behaviour as the PostgreSQL adapter with fully
//! serialised transactions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::domain::ports::{
    AuditLog, HistoryRepository, MembershipRepository, MembershipStoreError,
    MembershipTransaction, SegmentRepository, SegmentRepositoryError, UserRepository,
};
use crate::domain::{
    ExpirySweepReport, HistoryEntry, HistoryOperation, HistoryRecord, MembershipMutation,
    MembershipMutationError, MutationOutcome, Segment, SegmentId, SegmentSlug, UserId,
    UserSegments, apply_mutation, sweep_expired,
};

#[derive(Debug, Clone)]
struct HistoryRow {
    user_id: UserId,
    segment_id: SegmentId,
    operation: HistoryOperation,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    segments: BTreeMap<SegmentSlug, SegmentId>,
    last_segment_id: i32,
    users: BTreeSet<UserId>,
    memberships: BTreeMap<(UserId, SegmentId), Option<NaiveDate>>,
    history: Vec<HistoryRow>,
}

impl MemoryState {
    fn slug_of(&self, segment_id: SegmentId) -> Option<&SegmentSlug> {
        self.segments
            .iter()
            .find_map(|(slug, id)| (*id == segment_id).then_some(slug))
    }
}

/// Membership, segment, user and history store held in memory.
#[derive(Debug, Default)]
pub struct MemoryMembershipStore {
    state: Mutex<MemoryState>,
    fail_next_delete: AtomicBool,
}

impl MemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next membership delete remove its rows and then fail, so
    /// callers can observe the rollback.
    pub fn inject_delete_failure(&self) {
        self.fail_next_delete.store(true, Ordering::SeqCst);
    }
}

type MembershipKey = (UserId, SegmentId);

enum MembershipUndo {
    Remove(MembershipKey),
    Restore(MembershipKey, Option<NaiveDate>),
}

struct MemoryTx<'a> {
    state: &'a mut MemoryState,
    fail_delete: &'a AtomicBool,
    pending_history: Vec<HistoryRow>,
    undo: Vec<MembershipUndo>,
}

impl<'a> MemoryTx<'a> {
    fn begin(state: &'a mut MemoryState, fail_delete: &'a AtomicBool) -> Self {
        Self {
            state,
            fail_delete,
            pending_history: Vec::new(),
            undo: Vec::new(),
        }
    }

    fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E> {
        match result {
            Ok(value) => {
                self.state.history.extend(self.pending_history);
                Ok(value)
            }
            Err(err) => {
                for step in self.undo.into_iter().rev() {
                    match step {
                        MembershipUndo::Remove(key) => {
                            self.state.memberships.remove(&key);
                        }
                        MembershipUndo::Restore(key, alive_until) => {
                            self.state.memberships.insert(key, alive_until);
                        }
                    }
                }
                Err(err)
            }
        }
    }

    fn remove_membership(&mut self, key: MembershipKey) -> bool {
        match self.state.memberships.remove(&key) {
            Some(alive_until) => {
                self.undo.push(MembershipUndo::Restore(key, alive_until));
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl AuditLog for MemoryTx<'_> {
    async fn append(&mut self, record: &HistoryRecord) -> Result<(), MembershipStoreError> {
        self.pending_history
            .extend(record.segment_ids.iter().map(|segment_id| HistoryRow {
                user_id: record.user_id,
                segment_id: *segment_id,
                operation: record.operation,
                recorded_at: record.recorded_at,
            }));
        Ok(())
    }
}

#[async_trait]
impl MembershipTransaction for MemoryTx<'_> {
    async fn resolve_segment_ids(
        &mut self,
        slugs: &[SegmentSlug],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        Ok(slugs
            .iter()
            .filter_map(|slug| self.state.segments.get(slug).copied())
            .collect())
    }

    async fn insert_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
        alive_until: Option<NaiveDate>,
    ) -> Result<(), MembershipStoreError> {
        for segment_id in segment_ids {
            let key = (user_id, *segment_id);
            let previous = self.state.memberships.insert(key, alive_until);
            if let Some(existing) = previous {
                self.undo.push(MembershipUndo::Restore(key, existing));
                return Err(MembershipStoreError::duplicate(format!(
                    "user {user_id} segment {segment_id}"
                )));
            }
            self.undo.push(MembershipUndo::Remove(key));
        }
        Ok(())
    }

    async fn delete_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        let deleted: Vec<SegmentId> = segment_ids
            .iter()
            .filter(|segment_id| self.remove_membership((user_id, **segment_id)))
            .copied()
            .collect();
        if self.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(MembershipStoreError::query("injected delete failure"));
        }
        Ok(deleted)
    }

    async fn delete_expired(
        &mut self,
        cutoff: NaiveDate,
    ) -> Result<Vec<(UserId, SegmentId)>, MembershipStoreError> {
        let expired: Vec<(UserId, SegmentId)> = self
            .state
            .memberships
            .iter()
            .filter(|(_, alive_until)| alive_until.is_some_and(|date| date <= cutoff))
            .map(|(pair, _)| *pair)
            .collect();
        for pair in &expired {
            self.remove_membership(*pair);
        }
        Ok(expired)
    }
}

#[async_trait]
impl MembershipRepository for MemoryMembershipStore {
    async fn apply_mutation(
        &self,
        mutation: &MembershipMutation,
    ) -> Result<MutationOutcome, MembershipMutationError> {
        let mut state = self.state.lock().await;
        let mut tx = MemoryTx::begin(&mut state, &self.fail_next_delete);
        let result = apply_mutation(&mut tx, mutation).await;
        tx.finish(result)
    }

    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ExpirySweepReport, MembershipStoreError> {
        let mut state = self.state.lock().await;
        let mut tx = MemoryTx::begin(&mut state, &self.fail_next_delete);
        let result = sweep_expired(&mut tx, now).await;
        tx.finish(result)
    }

    async fn find_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSegments>, MembershipStoreError> {
        let state = self.state.lock().await;
        let segments: Vec<Segment> = state
            .memberships
            .keys()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, segment_id)| {
                state.slug_of(*segment_id).map(|slug| Segment {
                    id: *segment_id,
                    slug: slug.clone(),
                })
            })
            .collect();
        Ok((!segments.is_empty()).then(|| UserSegments::new(user_id, segments)))
    }

    async fn list_member_user_ids(&self) -> Result<Vec<UserId>, MembershipStoreError> {
        let state = self.state.lock().await;
        let users: BTreeSet<UserId> = state.memberships.keys().map(|(user, _)| *user).collect();
        Ok(users.into_iter().collect())
    }
}

#[async_trait]
impl SegmentRepository for MemoryMembershipStore {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, SegmentRepositoryError> {
        let mut state = self.state.lock().await;
        if state.segments.contains_key(slug) {
            return Err(SegmentRepositoryError::duplicate_slug(slug.as_ref()));
        }
        let next = state
            .last_segment_id
            .checked_add(1)
            .ok_or_else(|| SegmentRepositoryError::query("segment id space exhausted"))?;
        state.last_segment_id = next;
        let id = SegmentId::new(next);
        state.segments.insert(slug.clone(), id);
        Ok(Segment {
            id,
            slug: slug.clone(),
        })
    }

    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut state = self.state.lock().await;
        let Some(segment_id) = state.segments.get(slug).copied() else {
            return Err(SegmentRepositoryError::not_found(slug.as_ref()));
        };
        if state
            .memberships
            .keys()
            .any(|(_, member_of)| *member_of == segment_id)
        {
            return Err(SegmentRepositoryError::in_use(slug.as_ref()));
        }
        state.segments.remove(slug);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryMembershipStore {
    async fn allocate_user(&self) -> Result<UserId, MembershipStoreError> {
        let mut state = self.state.lock().await;
        let next = match state.users.last() {
            Some(last) => last.next(),
            None => UserId::new(1),
        }
        .map_err(|err| MembershipStoreError::query(err.to_string()))?;
        state.users.insert(next);
        Ok(next)
    }
}

#[async_trait]
impl HistoryRepository for MemoryMembershipStore {
    async fn history_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, MembershipStoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|row| row.recorded_at >= since)
            .map(|row| HistoryEntry {
                user_id: row.user_id,
                segment_id: row.segment_id,
                slug: state.slug_of(row.segment_id).cloned(),
                operation: row.operation,
                recorded_at: row.recorded_at,
            })
            .collect();
        entries.sort_by_key(|entry| entry.recorded_at);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::noon;

    fn slug(value: &str) -> SegmentSlug {
        SegmentSlug::new(value).expect("non-empty slug")
    }

    fn user(id: i64) -> UserId {
        UserId::new(id).expect("positive id")
    }

    fn mutation(
        user_id: UserId,
        add: &[&str],
        remove: &[&str],
        alive_until: Option<NaiveDate>,
    ) -> MembershipMutation {
        MembershipMutation {
            user_id,
            add: add.iter().map(|s| slug(s)).collect(),
            remove: remove.iter().map(|s| slug(s)).collect(),
            alive_until,
            recorded_at: noon(2024, 6, 1),
        }
    }

    #[fixture]
    async fn store() -> MemoryMembershipStore {
        let store = MemoryMembershipStore::new();
        for name in ["A", "B", "C"] {
            store
                .create_segment(&slug(name))
                .await
                .expect("segment created");
        }
        store
    }

    async fn slugs_of(store: &MemoryMembershipStore, user_id: UserId) -> Vec<String> {
        store
            .find_user_segments(user_id)
            .await
            .expect("read succeeds")
            .map(|s| s.slugs().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[rstest]
    #[tokio::test]
    async fn failed_delete_rolls_back_the_whole_mutation(
        #[future] store: MemoryMembershipStore,
    ) {
        let store = store.await;
        store
            .apply_mutation(&mutation(user(1), &["A", "B"], &[], None))
            .await
            .expect("seed memberships");
        let history_before = store
            .history_since(noon(2000, 1, 1))
            .await
            .expect("history")
            .len();

        store.inject_delete_failure();
        let err = store
            .apply_mutation(&mutation(user(1), &["C"], &["A", "B"], None))
            .await
            .expect_err("delete fails");

        assert!(matches!(err, MembershipMutationError::Store(_)));
        assert_eq!(slugs_of(&store, user(1)).await, ["A", "B"]);
        let history_after = store
            .history_since(noon(2000, 1, 1))
            .await
            .expect("history")
            .len();
        assert_eq!(history_after, history_before);
    }

    #[rstest]
    #[tokio::test]
    async fn rolled_back_mutation_keeps_no_audit_rows_and_later_commits_append(
        #[future] store: MemoryMembershipStore,
    ) {
        let store = store.await;
        store
            .apply_mutation(&mutation(user(1), &["A"], &[], None))
            .await
            .expect("seed membership");

        store.inject_delete_failure();
        store
            .apply_mutation(&mutation(user(1), &["B", "C"], &["A"], None))
            .await
            .expect_err("delete fails");
        assert_eq!(slugs_of(&store, user(1)).await, ["A"]);

        store
            .apply_mutation(&mutation(user(1), &["B"], &["A"], None))
            .await
            .expect("retry commits");

        let entries = store
            .history_since(noon(2000, 1, 1))
            .await
            .expect("history");
        let rows: Vec<(String, HistoryOperation)> = entries
            .iter()
            .map(|e| {
                let slug = e.slug.as_ref().map(ToString::to_string).unwrap_or_default();
                (slug, e.operation)
            })
            .collect();
        assert_eq!(
            rows,
            [
                ("A".to_owned(), HistoryOperation::Added),
                ("B".to_owned(), HistoryOperation::Added),
                ("A".to_owned(), HistoryOperation::Deleted),
            ]
        );
        assert_eq!(slugs_of(&store, user(1)).await, ["B"]);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_add_leaves_state_untouched(#[future] store: MemoryMembershipStore) {
        let store = store.await;
        store
            .apply_mutation(&mutation(user(1), &["A"], &[], None))
            .await
            .expect("seed membership");

        let err = store
            .apply_mutation(&mutation(user(1), &["B", "A"], &[], None))
            .await
            .expect_err("duplicate rejected");

        assert_eq!(err, MembershipMutationError::DuplicateMembership { user_id: user(1) });
        assert_eq!(slugs_of(&store, user(1)).await, ["A"]);
    }

    #[rstest]
    #[tokio::test]
    async fn sweep_removes_only_expired_rows(#[future] store: MemoryMembershipStore) {
        let store = store.await;
        let today = noon(2024, 6, 1).date_naive();
        store
            .apply_mutation(&mutation(user(1), &["A", "B"], &[], Some(today)))
            .await
            .expect("expiring memberships");
        store
            .apply_mutation(&mutation(
                user(1),
                &["C"],
                &[],
                today.checked_add_days(Days::new(1)),
            ))
            .await
            .expect("future membership");

        let report = store
            .sweep_expired(noon(2024, 6, 1))
            .await
            .expect("sweep runs");

        assert_eq!(report.expired_memberships, 2);
        assert_eq!(report.affected_users, 1);
        assert_eq!(slugs_of(&store, user(1)).await, ["C"]);
    }

    #[rstest]
    #[tokio::test]
    async fn segments_with_members_cannot_be_deleted(#[future] store: MemoryMembershipStore) {
        let store = store.await;
        store
            .apply_mutation(&mutation(user(2), &["A"], &[], None))
            .await
            .expect("membership");

        assert_eq!(
            store.delete_segment(&slug("A")).await,
            Err(SegmentRepositoryError::in_use("A"))
        );
        assert_eq!(store.delete_segment(&slug("B")).await, Ok(()));
        assert_eq!(
            store.delete_segment(&slug("B")).await,
            Err(SegmentRepositoryError::not_found("B"))
        );
        assert_eq!(
            store.create_segment(&slug("C")).await,
            Err(SegmentRepositoryError::duplicate_slug("C"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn users_are_allocated_sequentially() {
        let store = MemoryMembershipStore::new();
        let first = store.allocate_user().await.expect("first user");
        let second = store.allocate_user().await.expect("second user");
        assert_eq!((first.get(), second.get()), (1, 2));
    }

    #[rstest]
    #[tokio::test]
    async fn history_outlives_deleted_segments(#[future] store: MemoryMembershipStore) {
        let store = store.await;
        store
            .apply_mutation(&mutation(user(3), &["B"], &[], None))
            .await
            .expect("add");
        store
            .apply_mutation(&mutation(user(3), &[], &["B"], None))
            .await
            .expect("remove");
        store.delete_segment(&slug("B")).await.expect("segment unused");

        let entries = store
            .history_since(noon(2024, 1, 1))
            .await
            .expect("history");
        let operations: Vec<HistoryOperation> = entries.iter().map(|e| e.operation).collect();
        assert_eq!(operations, [HistoryOperation::Added, HistoryOperation::Deleted]);
        assert!(entries.iter().all(|e| e.slug.is_none()));
    }
}
