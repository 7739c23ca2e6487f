//! Segment membership service.
//!
//! Users belong to named segments, optionally until an expiry date. Every
//! membership change is applied atomically together with an audit record,
//! mutating requests are gated by an idempotency key, expired memberships
//! are removed by a daily sweep, and reads are served from a cache that a
//! background refresher keeps warm.
//!
//! Layout:
//! - [`domain`]: value types, ports, transactional algorithms, services.
//! - [`inbound`]: actix-web handlers.
//! - [`outbound`]: PostgreSQL, Redis and in-memory adapters.
//! - [`jobs`]: the periodic task scheduler.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod jobs;
pub mod middleware;
pub mod outbound;
#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
