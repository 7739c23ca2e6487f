//! Validated server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use segments::domain::{CacheRefreshConfig, IdempotencyConfig};
use segments::jobs::Schedule;
use segments::outbound::persistence::PoolConfig;

/// Redis connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Everything the binary needs to wire adapters, jobs and the listener.
///
/// Built from [`ServiceSettings`](super::settings::ServiceSettings); a
/// missing `database` or `redis` selects the in-memory adapters.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database: Option<PoolConfig>,
    pub redis: Option<RedisConfig>,
    pub idempotency: IdempotencyConfig,
    pub refresh: CacheRefreshConfig,
    pub refresh_schedule: Schedule,
    pub sweep_schedule: Schedule,
    pub job_run_timeout: Duration,
    pub request_timeout: Duration,
}
