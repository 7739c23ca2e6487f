//! Segment catalogue, user allocation and audit report use cases.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info};

use crate::domain::ports::{
    HistoryQuery, HistoryRepository, MembershipStoreError, SegmentCommand, SegmentRepository,
    SegmentRepositoryError, UserCommand, UserRepository,
};
use crate::domain::{Error, HistoryEntry, Segment, SegmentSlug, UserId};

/// Domain service for the simple single-row operations around memberships.
#[derive(Clone)]
pub struct CatalogueService {
    segments: Arc<dyn SegmentRepository>,
    users: Arc<dyn UserRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl CatalogueService {
    pub fn new(
        segments: Arc<dyn SegmentRepository>,
        users: Arc<dyn UserRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            segments,
            users,
            history,
        }
    }
}

fn map_segment_error(err: SegmentRepositoryError) -> Error {
    match err {
        SegmentRepositoryError::DuplicateSlug { slug } => {
            Error::conflict(format!("segment {slug} already exists"))
                .with_details(json!({ "code": "duplicate_segment", "slug": slug }))
        }
        SegmentRepositoryError::NotFound { slug } => {
            Error::not_found(format!("segment {slug} does not exist"))
                .with_details(json!({ "code": "segment_not_found", "slug": slug }))
        }
        SegmentRepositoryError::InUse { slug } => {
            Error::conflict(format!("segment {slug} still has members"))
                .with_details(json!({ "code": "segment_in_use", "slug": slug }))
        }
        other @ (SegmentRepositoryError::Connection { .. }
        | SegmentRepositoryError::Query { .. }) => {
            error!(error = %other, "segment store failure");
            Error::internal(format!("segment store error: {other}"))
        }
    }
}

fn map_store_error(err: MembershipStoreError) -> Error {
    error!(error = %err, "membership store failure");
    Error::internal(format!("membership store error: {err}"))
}

#[async_trait]
impl SegmentCommand for CatalogueService {
    async fn create_segment(&self, slug: SegmentSlug) -> Result<Segment, Error> {
        let segment = self
            .segments
            .create_segment(&slug)
            .await
            .map_err(map_segment_error)?;
        info!(segment_id = %segment.id, slug = %segment.slug, "segment created");
        Ok(segment)
    }

    async fn delete_segment(&self, slug: SegmentSlug) -> Result<(), Error> {
        self.segments
            .delete_segment(&slug)
            .await
            .map_err(map_segment_error)?;
        info!(%slug, "segment deleted");
        Ok(())
    }
}

#[async_trait]
impl UserCommand for CatalogueService {
    async fn create_user(&self) -> Result<UserId, Error> {
        let user_id = self.users.allocate_user().await.map_err(map_store_error)?;
        info!(%user_id, "user allocated");
        Ok(user_id)
    }
}

#[async_trait]
impl HistoryQuery for CatalogueService {
    async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, Error> {
        self.history
            .history_since(since)
            .await
            .map_err(map_store_error)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockHistoryRepository, MockSegmentRepository, MockUserRepository,
    };
    use crate::domain::{HistoryOperation, SegmentId};
    use crate::test_support::noon;

    fn slug(value: &str) -> SegmentSlug {
        SegmentSlug::new(value).expect("non-empty slug")
    }

    fn service(
        segments: MockSegmentRepository,
        users: MockUserRepository,
        history: MockHistoryRepository,
    ) -> CatalogueService {
        CatalogueService::new(Arc::new(segments), Arc::new(users), Arc::new(history))
    }

    #[rstest]
    #[tokio::test]
    async fn create_segment_returns_stored_segment() {
        let mut segments = MockSegmentRepository::new();
        segments
            .expect_create_segment()
            .with(eq(slug("AVITO_VOICE_MESSAGES")))
            .times(1)
            .return_once(|slug| {
                Ok(Segment {
                    id: SegmentId::new(4),
                    slug: slug.clone(),
                })
            });

        let segment = service(segments, MockUserRepository::new(), MockHistoryRepository::new())
            .create_segment(slug("AVITO_VOICE_MESSAGES"))
            .await
            .expect("segment created");
        assert_eq!(segment.id, SegmentId::new(4));
    }

    #[rstest]
    #[case(SegmentRepositoryError::duplicate_slug("A"), ErrorCode::Conflict, Some("duplicate_segment"))]
    #[case(SegmentRepositoryError::not_found("A"), ErrorCode::NotFound, Some("segment_not_found"))]
    #[case(SegmentRepositoryError::in_use("A"), ErrorCode::Conflict, Some("segment_in_use"))]
    #[case(SegmentRepositoryError::connection("refused"), ErrorCode::InternalError, None)]
    #[tokio::test]
    async fn delete_segment_maps_store_errors(
        #[case] failure: SegmentRepositoryError,
        #[case] code: ErrorCode,
        #[case] detail: Option<&str>,
    ) {
        let mut segments = MockSegmentRepository::new();
        segments
            .expect_delete_segment()
            .times(1)
            .return_once(move |_| Err(failure));

        let err = service(segments, MockUserRepository::new(), MockHistoryRepository::new())
            .delete_segment(slug("A"))
            .await
            .expect_err("delete fails");
        assert_eq!(err.code(), code);
        assert_eq!(err.detail_code(), detail);
    }

    #[rstest]
    #[tokio::test]
    async fn create_user_returns_allocated_id() {
        let mut users = MockUserRepository::new();
        users
            .expect_allocate_user()
            .times(1)
            .return_once(|| Ok(UserId::new(8).expect("positive id")));

        let user_id = service(MockSegmentRepository::new(), users, MockHistoryRepository::new())
            .create_user()
            .await
            .expect("user allocated");
        assert_eq!(user_id.get(), 8);
    }

    #[rstest]
    #[tokio::test]
    async fn history_passes_through_entries() {
        let since = noon(2024, 1, 1);
        let mut history = MockHistoryRepository::new();
        history
            .expect_history_since()
            .with(eq(since))
            .times(1)
            .return_once(move |_| {
                Ok(vec![HistoryEntry {
                    user_id: UserId::new(1).expect("positive id"),
                    segment_id: SegmentId::new(2),
                    slug: None,
                    operation: HistoryOperation::Deleted,
                    recorded_at: since,
                }])
            });

        let entries = service(MockSegmentRepository::new(), MockUserRepository::new(), history)
            .history_since(since)
            .await
            .expect("history read");
        assert_eq!(entries.len(), 1);
        assert!(entries.iter().all(|e| e.slug.is_none()));
    }
}
