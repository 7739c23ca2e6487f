//! Translation of pool and Diesel failures into port errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{MembershipStoreError, SegmentRepositoryError};

use super::pool::PoolError;

/// Failure inside a Diesel transaction closure: either a domain outcome
/// that forces rollback, or an error from the transaction machinery.
#[derive(Debug)]
pub(crate) enum TxFailure<E> {
    Domain(E),
    Diesel(DieselError),
}

impl<E> From<DieselError> for TxFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl<E> TxFailure<E> {
    /// Collapse into the port error, mapping transaction machinery errors
    /// with `map_diesel`.
    pub(crate) fn resolve(self, map_diesel: impl FnOnce(DieselError) -> E) -> E {
        match self {
            Self::Domain(err) => err,
            Self::Diesel(err) => map_diesel(err),
        }
    }
}

/// Coarse classification shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection,
    UniqueViolation,
    Query,
}

pub(crate) fn classify(error: &DieselError) -> DieselFailure {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DieselFailure::UniqueViolation
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => DieselFailure::Connection,
        _ => DieselFailure::Query,
    }
}

pub(crate) fn map_store_pool_error(error: PoolError) -> MembershipStoreError {
    MembershipStoreError::connection(error.into_message())
}

pub(crate) fn map_store_diesel_error(error: DieselError) -> MembershipStoreError {
    match classify(&error) {
        DieselFailure::Connection => MembershipStoreError::connection("database connection error"),
        DieselFailure::UniqueViolation => MembershipStoreError::duplicate("unique constraint violated"),
        DieselFailure::Query => MembershipStoreError::query(error.to_string()),
    }
}

pub(crate) fn map_segment_pool_error(error: PoolError) -> SegmentRepositoryError {
    SegmentRepositoryError::connection(error.into_message())
}

pub(crate) fn map_segment_diesel_error(error: DieselError) -> SegmentRepositoryError {
    match classify(&error) {
        DieselFailure::Connection => SegmentRepositoryError::connection("database connection error"),
        DieselFailure::UniqueViolation | DieselFailure::Query => {
            SegmentRepositoryError::query(error.to_string())
        }
    }
}
