//! Driving port for the membership audit report.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, HistoryEntry};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryQuery: Send + Sync {
    /// Audit entries recorded at or after `since`, oldest first.
    async fn history_since(&self, since: DateTime<Utc>) -> Result<Vec<HistoryEntry>, Error>;
}
