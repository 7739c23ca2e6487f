//! Port for reading the membership audit trail.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::HistoryEntry;

use super::MembershipStoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Audit rows recorded at or after `since`, oldest first, joined with
    /// the current slug of each segment.
    async fn history_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, MembershipStoreError>;
}
