//! PostgreSQL segment catalogue.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{SegmentRepository, SegmentRepositoryError};
use crate::domain::{Segment, SegmentId, SegmentSlug};

use super::error_mapping::{
    DieselFailure, TxFailure, classify, map_segment_diesel_error, map_segment_pool_error,
};
use super::models::{NewSegmentRow, SegmentRow};
use super::pool::DbPool;
use super::schema::{segments, user_segments};

/// Diesel-backed implementation of [`SegmentRepository`].
#[derive(Clone)]
pub struct DieselSegmentRepository {
    pool: DbPool,
}

impl DieselSegmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SegmentRepository for DieselSegmentRepository {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<Segment, SegmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_segment_pool_error)?;
        let row: SegmentRow = diesel::insert_into(segments::table)
            .values(NewSegmentRow {
                slug: slug.as_ref(),
            })
            .returning(SegmentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| match classify(&err) {
                DieselFailure::UniqueViolation => {
                    SegmentRepositoryError::duplicate_slug(slug.as_ref())
                }
                DieselFailure::Connection | DieselFailure::Query => map_segment_diesel_error(err),
            })?;
        Ok(Segment {
            id: SegmentId::new(row.segment_id),
            slug: slug.clone(),
        })
    }

    /// Looks up, checks for members and deletes in one transaction; the
    /// membership foreign key rejects any row inserted concurrently.
    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_segment_pool_error)?;
        let result: Result<(), TxFailure<SegmentRepositoryError>> = conn
            .transaction(|conn| {
                async move {
                    let segment_id: Option<i32> = segments::table
                        .filter(segments::slug.eq(slug.as_ref()))
                        .select(segments::segment_id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(segment_id) = segment_id else {
                        return Err(TxFailure::Domain(SegmentRepositoryError::not_found(
                            slug.as_ref(),
                        )));
                    };

                    let in_use: bool = diesel::select(diesel::dsl::exists(
                        user_segments::table.filter(user_segments::segment_id.eq(segment_id)),
                    ))
                    .get_result(conn)
                    .await?;
                    if in_use {
                        return Err(TxFailure::Domain(SegmentRepositoryError::in_use(
                            slug.as_ref(),
                        )));
                    }

                    diesel::delete(segments::table.filter(segments::segment_id.eq(segment_id)))
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        result.map_err(|failure| failure.resolve(map_segment_diesel_error))
    }
}
