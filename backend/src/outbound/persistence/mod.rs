//! PostgreSQL adapters built on Diesel, `diesel-async` and a bb8 pool.
//!
//! Row structs and table definitions stay private to this module; adapters
//! translate them to domain types at the boundary. Every write that must be
//! atomic runs inside `AsyncConnection::transaction`.
//!
//! ```no_run
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! use segments::outbound::persistence::{DbPool, DieselMembershipRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/segments")).await?;
//! let repo = DieselMembershipRepository::new(pool);
//! # let _ = repo;
//! # Ok(())
//! # }
//! ```

mod diesel_history_repository;
mod diesel_membership_repository;
mod diesel_segment_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_history_repository::DieselHistoryRepository;
pub use diesel_membership_repository::DieselMembershipRepository;
pub use diesel_segment_repository::DieselSegmentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
