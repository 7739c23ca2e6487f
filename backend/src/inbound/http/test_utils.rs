//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{
    MockHistoryQuery, MockMembershipCommand, MockMembershipQuery, MockSegmentCommand,
    MockUserCommand,
};
use crate::domain::{IdempotencyConfig, IdempotencyGuard};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::MemoryIdempotencyStore;

/// Ports whose mocks carry no expectations, so any call fails the test.
pub fn unused_ports() -> HttpStatePorts {
    HttpStatePorts {
        memberships: Arc::new(MockMembershipCommand::new()),
        memberships_query: Arc::new(MockMembershipQuery::new()),
        segments: Arc::new(MockSegmentCommand::new()),
        users: Arc::new(MockUserCommand::new()),
        history: Arc::new(MockHistoryQuery::new()),
    }
}

/// Build an app over `ports` with a fresh in-memory idempotency store.
pub fn test_app(
    ports: HttpStatePorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let guard = IdempotencyGuard::new(
        Arc::new(MemoryIdempotencyStore::new()),
        IdempotencyConfig::default(),
    );
    App::new()
        .app_data(web::Data::new(HttpState::new(ports, guard)))
        .configure(configure_api)
}
