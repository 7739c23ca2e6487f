//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories over Diesel
//! - **cache**: Redis snapshot cache and idempotency markers
//! - **memory**: in-process stand-ins for both
//!
//! Adapters translate between domain types and storage representations and
//! hold no membership rules of their own.

pub mod cache;
pub mod memory;
pub mod persistence;
