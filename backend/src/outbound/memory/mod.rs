//! In-process adapters for running without PostgreSQL or Redis.
//!
//! They implement the same ports as the external adapters and keep the
//! same transactional guarantees within one process.

mod idempotency_store;
mod membership_store;
mod segment_cache;

pub use idempotency_store::MemoryIdempotencyStore;
pub use membership_store::MemoryMembershipStore;
pub use segment_cache::MemorySegmentCache;
