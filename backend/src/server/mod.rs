//! Server construction and middleware wiring.

mod config;
pub mod settings;
mod state_builders;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::Clock;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use segments::Trace;
#[cfg(debug_assertions)]
use segments::doc::ApiDoc;
use segments::inbound::http::configure_api;
use segments::inbound::http::health::{HealthState, live, ready};
use segments::inbound::http::state::HttpState;
use segments::jobs::JobHandle;

use state_builders::{build_http_state, build_stores, start_jobs};

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure_api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// A bound server plus the background jobs that run beside it.
pub struct RunningService {
    pub server: Server,
    pub jobs: Vec<JobHandle>,
}

/// Connect stores, start background jobs and bind the HTTP listener.
///
/// Readiness is flagged once the listener is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when a store is unreachable, a migration
/// fails, or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    clock: Arc<dyn Clock>,
) -> std::io::Result<RunningService> {
    let stores = build_stores(&config).await?;
    let http_state = build_http_state(&stores, &config, Arc::clone(&clock));

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(config.bind_addr)?
        .run();

    let jobs = start_jobs(&stores, &config, clock);
    health_state.mark_ready();
    Ok(RunningService { server, jobs })
}
