//! PostgreSQL audit trail reader.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{HistoryRepository, MembershipStoreError};
use crate::domain::{HistoryEntry, HistoryOperation, SegmentId};

use super::diesel_membership_repository::{slug_from_row, user_id_from_row};
use super::error_mapping::{map_store_diesel_error, map_store_pool_error};
use super::models::HistoryEntryRow;
use super::pool::DbPool;
use super::schema::{history, segments};

/// Diesel-backed implementation of [`HistoryRepository`].
#[derive(Clone)]
pub struct DieselHistoryRepository {
    pool: DbPool,
}

impl DieselHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: HistoryEntryRow) -> Result<HistoryEntry, MembershipStoreError> {
    let operation = row
        .operation
        .parse::<HistoryOperation>()
        .map_err(|err| MembershipStoreError::query(err.to_string()))?;
    Ok(HistoryEntry {
        user_id: user_id_from_row(row.user_id)?,
        segment_id: SegmentId::new(row.segment_id),
        slug: row.slug.map(slug_from_row).transpose()?,
        operation,
        recorded_at: row.recorded_at,
    })
}

#[async_trait]
impl HistoryRepository for DieselHistoryRepository {
    async fn history_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_store_pool_error)?;
        let rows: Vec<HistoryEntryRow> = history::table
            .left_join(segments::table.on(segments::segment_id.eq(history::segment_id)))
            .filter(history::recorded_at.ge(since))
            .order_by((history::recorded_at, history::history_id))
            .select((
                history::user_id,
                history::segment_id,
                history::operation,
                history::recorded_at,
                segments::slug.nullable(),
            ))
            .load(&mut conn)
            .await
            .map_err(map_store_diesel_error)?;
        rows.into_iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_support::noon;

    fn row(operation: &str, slug: Option<&str>) -> HistoryEntryRow {
        HistoryEntryRow {
            user_id: 3,
            segment_id: 9,
            operation: operation.to_owned(),
            recorded_at: noon(2024, 4, 2),
            slug: slug.map(str::to_owned),
        }
    }

    #[rstest]
    fn deleted_segments_keep_their_audit_rows() {
        let entry = row_to_entry(row("deleted", None)).expect("valid row");
        assert_eq!(entry.operation, HistoryOperation::Deleted);
        assert!(entry.slug.is_none());
        assert_eq!(entry.segment_id, SegmentId::new(9));
    }

    #[rstest]
    #[case(row("renamed", Some("A")))]
    #[case(HistoryEntryRow { user_id: 0, ..row("added", Some("A")) })]
    fn corrupt_rows_are_query_errors(#[case] bad: HistoryEntryRow) {
        assert!(matches!(row_to_entry(bad), Err(MembershipStoreError::Query { .. })));
    }
}
