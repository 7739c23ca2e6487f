//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, `*Store`, `*Cache`, [`MembershipTransaction`])
//! are implemented by outbound adapters. Driving ports (`*Command`, `*Query`)
//! are implemented by domain services and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod history_query;
mod history_repository;
mod idempotency_store;
mod membership_command;
mod membership_query;
mod membership_repository;
mod membership_transaction;
mod segment_cache;
mod segment_command;
mod segment_repository;
mod user_command;
mod user_repository;

pub use cache_key::{SegmentCacheKey, SegmentCacheKeyValidationError};
#[cfg(test)]
pub use history_query::MockHistoryQuery;
pub use history_query::HistoryQuery;
#[cfg(test)]
pub use history_repository::MockHistoryRepository;
pub use history_repository::HistoryRepository;
#[cfg(test)]
pub use idempotency_store::MockIdempotencyStore;
pub use idempotency_store::{IdempotencyStore, IdempotencyStoreError};
#[cfg(test)]
pub use membership_command::MockMembershipCommand;
pub use membership_command::MembershipCommand;
#[cfg(test)]
pub use membership_query::MockMembershipQuery;
pub use membership_query::MembershipQuery;
#[cfg(test)]
pub use membership_repository::MockMembershipRepository;
pub use membership_repository::MembershipRepository;
pub use membership_transaction::{AuditLog, MembershipStoreError, MembershipTransaction};
#[cfg(test)]
pub use segment_cache::MockSegmentCache;
pub use segment_cache::{SegmentCache, SegmentCacheError};
#[cfg(test)]
pub use segment_command::MockSegmentCommand;
pub use segment_command::SegmentCommand;
#[cfg(test)]
pub use segment_repository::MockSegmentRepository;
pub use segment_repository::{SegmentRepository, SegmentRepositoryError};
#[cfg(test)]
pub use user_command::MockUserCommand;
pub use user_command::UserCommand;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
mod tests;
