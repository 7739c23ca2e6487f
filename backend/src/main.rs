//! Service entry-point: loads settings, wires adapters, starts background
//! jobs and serves the REST API.

mod server;

use std::ffi::OsString;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use segments::inbound::http::health::HealthState;
use server::settings::ServiceSettings;
use server::{RunningService, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args: Vec<OsString> = std::env::args_os().collect();
    let settings = ServiceSettings::load_from_iter(args)
        .map_err(|err| std::io::Error::other(format!("failed to load settings: {err}")))?;
    let config = settings
        .into_server_config()
        .map_err(|err| std::io::Error::other(format!("invalid settings: {err}")))?;
    info!(bind_addr = %config.bind_addr, "starting segment membership service");

    let health_state = web::Data::new(HealthState::new());
    let RunningService { server, jobs } =
        create_server(health_state.clone(), config, Arc::new(DefaultClock)).await?;

    let result = server.await;

    health_state.mark_unhealthy();
    for job in jobs {
        job.stop().await;
    }
    info!("segment membership service stopped");
    result
}
