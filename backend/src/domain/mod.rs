//! Domain primitives, transactional algorithms and services.
//!
//! Purpose: hold everything that defines segment membership semantics
//! independently of HTTP, PostgreSQL or Redis. Adapters depend on this
//! module; it depends on none of them.
//!
//! Public surface:
//! - Value types: [`UserId`], [`SegmentId`], [`SegmentSlug`], [`Segment`],
//!   [`UserSegments`], [`HistoryRecord`], [`HistoryEntry`],
//!   [`IdempotencyKey`].
//! - Algorithms run inside store transactions: [`apply_mutation`] and
//!   [`sweep_expired`].
//! - Services implementing driving ports: [`MembershipService`],
//!   [`CatalogueService`], plus the background [`CacheRefresher`] and
//!   [`ExpirySweeper`] and the [`IdempotencyGuard`].
//! - [`Error`] and [`ErrorCode`], the transport-agnostic failure payload.

pub mod cache_refresher;
pub mod catalogue_service;
pub mod error;
pub mod expiry_sweeper;
pub mod history;
pub mod idempotency;
pub mod membership;
pub mod membership_service;
pub mod ports;
pub mod segment;
pub mod trace_id;
pub mod user;

pub use self::cache_refresher::{CacheRefreshConfig, CacheRefresher, RefreshReport};
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::expiry_sweeper::ExpirySweeper;
pub use self::history::{HistoryEntry, HistoryOperation, HistoryRecord, UnknownHistoryOperation};
pub use self::idempotency::{
    IDEMPOTENCY_KEY_REPLAYED, IdempotencyConfig, IdempotencyGuard, IdempotencyKey,
    IdempotencyKeyValidationError,
};
pub use self::membership::{
    ExpirySweepReport, MembershipMutation, MembershipMutationError, MembershipRequest,
    MembershipRequestError, MembershipTtl, MutationOutcome, apply_mutation, sweep_expired,
};
pub use self::membership_service::MembershipService;
pub use self::segment::{Segment, SegmentId, SegmentSlug, SegmentSlugValidationError, UserSegments};
pub use self::trace_id::TraceId;
pub use self::user::{UserId, UserIdValidationError};

/// HTTP header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";
