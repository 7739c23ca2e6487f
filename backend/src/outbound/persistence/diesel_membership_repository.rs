//! PostgreSQL membership store.
//!
//! Mutations and sweeps run the domain algorithms against a
//! [`DieselMembershipTx`] inside `AsyncConnection::transaction`, so any
//! `Err` they return rolls back every row written so far.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    AuditLog, MembershipRepository, MembershipStoreError, MembershipTransaction,
};
use crate::domain::{
    ExpirySweepReport, HistoryRecord, MembershipMutation, MembershipMutationError,
    MutationOutcome, Segment, SegmentId, SegmentSlug, UserId, UserSegments, apply_mutation,
    sweep_expired,
};

use super::error_mapping::{TxFailure, map_store_diesel_error, map_store_pool_error};
use super::models::{NewHistoryRow, NewMembershipRow};
use super::pool::DbPool;
use super::schema::{history, segments, user_segments};

/// Diesel-backed implementation of [`MembershipRepository`].
#[derive(Clone)]
pub struct DieselMembershipRepository {
    pool: DbPool,
}

impl DieselMembershipRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// [`MembershipTransaction`] over a connection with an open transaction.
pub(crate) struct DieselMembershipTx<'a> {
    conn: &'a mut AsyncPgConnection,
}

pub(crate) fn user_id_from_row(raw: i32) -> Result<UserId, MembershipStoreError> {
    UserId::new(i64::from(raw))
        .map_err(|err| MembershipStoreError::query(format!("stored user id {raw}: {err}")))
}

pub(crate) fn slug_from_row(raw: String) -> Result<SegmentSlug, MembershipStoreError> {
    SegmentSlug::new(&raw)
        .map_err(|err| MembershipStoreError::query(format!("stored slug {raw:?}: {err}")))
}

fn raw_ids(segment_ids: &[SegmentId]) -> Vec<i32> {
    segment_ids.iter().map(|id| id.get()).collect()
}

#[async_trait]
impl AuditLog for DieselMembershipTx<'_> {
    async fn append(&mut self, record: &HistoryRecord) -> Result<(), MembershipStoreError> {
        let rows: Vec<NewHistoryRow<'_>> = record
            .segment_ids
            .iter()
            .map(|segment_id| NewHistoryRow {
                user_id: record.user_id.get(),
                segment_id: segment_id.get(),
                operation: record.operation.as_str(),
                recorded_at: record.recorded_at,
            })
            .collect();
        diesel::insert_into(history::table)
            .values(&rows)
            .execute(&mut *self.conn)
            .await
            .map_err(map_store_diesel_error)?;
        Ok(())
    }
}

#[async_trait]
impl MembershipTransaction for DieselMembershipTx<'_> {
    async fn resolve_segment_ids(
        &mut self,
        slugs: &[SegmentSlug],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        let raw: Vec<&str> = slugs.iter().map(AsRef::as_ref).collect();
        let ids: Vec<i32> = segments::table
            .filter(segments::slug.eq_any(raw))
            .select(segments::segment_id)
            .order_by(segments::segment_id)
            .load(&mut *self.conn)
            .await
            .map_err(map_store_diesel_error)?;
        Ok(ids.into_iter().map(SegmentId::new).collect())
    }

    async fn insert_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
        alive_until: Option<NaiveDate>,
    ) -> Result<(), MembershipStoreError> {
        let rows: Vec<NewMembershipRow> = segment_ids
            .iter()
            .map(|segment_id| NewMembershipRow {
                user_id: user_id.get(),
                segment_id: segment_id.get(),
                alive_until,
            })
            .collect();
        diesel::insert_into(user_segments::table)
            .values(&rows)
            .execute(&mut *self.conn)
            .await
            .map_err(map_store_diesel_error)?;
        Ok(())
    }

    async fn delete_memberships(
        &mut self,
        user_id: UserId,
        segment_ids: &[SegmentId],
    ) -> Result<Vec<SegmentId>, MembershipStoreError> {
        let deleted: Vec<i32> = diesel::delete(
            user_segments::table
                .filter(user_segments::user_id.eq(user_id.get()))
                .filter(user_segments::segment_id.eq_any(raw_ids(segment_ids))),
        )
        .returning(user_segments::segment_id)
        .get_results(&mut *self.conn)
        .await
        .map_err(map_store_diesel_error)?;
        Ok(deleted.into_iter().map(SegmentId::new).collect())
    }

    async fn delete_expired(
        &mut self,
        cutoff: NaiveDate,
    ) -> Result<Vec<(UserId, SegmentId)>, MembershipStoreError> {
        let deleted: Vec<(i32, i32)> =
            diesel::delete(user_segments::table.filter(user_segments::alive_until.le(cutoff)))
                .returning((user_segments::user_id, user_segments::segment_id))
                .get_results(&mut *self.conn)
                .await
                .map_err(map_store_diesel_error)?;
        deleted
            .into_iter()
            .map(|(user_id, segment_id)| Ok((user_id_from_row(user_id)?, SegmentId::new(segment_id))))
            .collect()
    }
}

#[async_trait]
impl MembershipRepository for DieselMembershipRepository {
    async fn apply_mutation(
        &self,
        mutation: &MembershipMutation,
    ) -> Result<MutationOutcome, MembershipMutationError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let result: Result<MutationOutcome, TxFailure<MembershipMutationError>> = conn
            .transaction(|conn| {
                async move {
                    let mut tx = DieselMembershipTx { conn };
                    apply_mutation(&mut tx, mutation)
                        .await
                        .map_err(TxFailure::Domain)
                }
                .scope_boxed()
            })
            .await;
        result.map_err(|failure| failure.resolve(|err| map_store_diesel_error(err).into()))
    }

    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ExpirySweepReport, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let result: Result<ExpirySweepReport, TxFailure<MembershipStoreError>> = conn
            .transaction(|conn| {
                async move {
                    let mut tx = DieselMembershipTx { conn };
                    sweep_expired(&mut tx, now).await.map_err(TxFailure::Domain)
                }
                .scope_boxed()
            })
            .await;
        result.map_err(|failure| failure.resolve(map_store_diesel_error))
    }

    async fn find_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserSegments>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let rows: Vec<(i32, String)> = user_segments::table
            .inner_join(segments::table)
            .filter(user_segments::user_id.eq(user_id.get()))
            .select((segments::segment_id, segments::slug))
            .order_by(segments::slug)
            .load(&mut conn)
            .await
            .map_err(map_store_diesel_error)?;
        if rows.is_empty() {
            return Ok(None);
        }
        let segments = rows
            .into_iter()
            .map(|(id, slug)| {
                Ok(Segment {
                    id: SegmentId::new(id),
                    slug: slug_from_row(slug)?,
                })
            })
            .collect::<Result<Vec<_>, MembershipStoreError>>()?;
        Ok(Some(UserSegments::new(user_id, segments)))
    }

    async fn list_member_user_ids(&self) -> Result<Vec<UserId>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let ids: Vec<i32> = user_segments::table
            .select(user_segments::user_id)
            .distinct()
            .order_by(user_segments::user_id)
            .load(&mut conn)
            .await
            .map_err(map_store_diesel_error)?;
        ids.into_iter().map(user_id_from_row).collect()
    }
}
