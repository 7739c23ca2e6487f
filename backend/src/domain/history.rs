//! Audit trail of membership changes.
//!
//! A [`HistoryRecord`] is written inside the transaction that performs the
//! change it describes and batches every segment touched by one operation.
//! Stores flatten it to one row per segment; reports read those rows back as
//! [`HistoryEntry`] values.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{SegmentId, SegmentSlug, UserId};

/// Kind of membership change recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOperation {
    Added,
    Deleted,
}

impl HistoryOperation {
    /// Stable storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored operation name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown history operation: {0}")]
pub struct UnknownHistoryOperation(pub String);

impl FromStr for HistoryOperation {
    type Err = UnknownHistoryOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "deleted" => Ok(Self::Deleted),
            other => Err(UnknownHistoryOperation(other.to_owned())),
        }
    }
}

/// One audit record: a user, the segments affected by one operation, and
/// when it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub user_id: UserId,
    pub segment_ids: Vec<SegmentId>,
    pub operation: HistoryOperation,
    pub recorded_at: DateTime<Utc>,
}

/// A flattened audit row as returned by the history report.
///
/// `slug` is `None` when the segment was deleted after the change was
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub user_id: UserId,
    pub segment_id: SegmentId,
    pub slug: Option<SegmentSlug>,
    pub operation: HistoryOperation,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HistoryOperation::Added)]
    #[case(HistoryOperation::Deleted)]
    fn storage_names_parse_back(#[case] operation: HistoryOperation) {
        assert_eq!(operation.as_str().parse::<HistoryOperation>(), Ok(operation));
    }

    #[rstest]
    fn unknown_operation_is_rejected() {
        let err = "renamed".parse::<HistoryOperation>().expect_err("unknown op");
        assert_eq!(err, UnknownHistoryOperation("renamed".to_owned()));
    }
}
