//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::IdempotencyGuard;
use crate::domain::ports::{
    HistoryQuery, MembershipCommand, MembershipQuery, SegmentCommand, UserCommand,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub memberships: Arc<dyn MembershipCommand>,
    pub memberships_query: Arc<dyn MembershipQuery>,
    pub segments: Arc<dyn SegmentCommand>,
    pub users: Arc<dyn UserCommand>,
    pub history: Arc<dyn HistoryQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub memberships: Arc<dyn MembershipCommand>,
    pub memberships_query: Arc<dyn MembershipQuery>,
    pub segments: Arc<dyn SegmentCommand>,
    pub users: Arc<dyn UserCommand>,
    pub history: Arc<dyn HistoryQuery>,
    /// Gate applied to every mutating endpoint.
    pub idempotency: IdempotencyGuard,
}

impl HttpState {
    pub fn new(ports: HttpStatePorts, idempotency: IdempotencyGuard) -> Self {
        let HttpStatePorts {
            memberships,
            memberships_query,
            segments,
            users,
            history,
        } = ports;
        Self {
            memberships,
            memberships_query,
            segments,
            users,
            history,
            idempotency,
        }
    }
}
