//! Service settings loaded via OrthoConfig.
//!
//! Every field can be given as a CLI flag, a `SEGMENTS_*` environment
//! variable or a config file entry. Absent values fall back to the defaults
//! below; [`ServiceSettings::into_server_config`] validates the result.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use segments::domain::{CacheRefreshConfig, IdempotencyConfig};
use segments::jobs::{Schedule, ScheduleError};
use segments::outbound::persistence::PoolConfig;

use super::config::{RedisConfig, ServerConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_JOB_RUN_TIMEOUT_SECS: u64 = 600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Raw service settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SEGMENTS")]
pub struct ServiceSettings {
    /// Address to bind the HTTP listener to.
    pub host: Option<String>,
    /// Port to bind the HTTP listener to.
    pub port: Option<u16>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Redis URL; in-memory cache and idempotency markers are used when
    /// absent.
    pub redis_url: Option<String>,
    /// How long a consumed idempotency key rejects replays.
    pub idempotency_ttl_minutes: Option<u64>,
    /// Lifetime of a cached membership snapshot.
    pub cache_ttl_secs: Option<u64>,
    /// Time between cache refresh cycles.
    pub cache_refresh_interval_secs: Option<u64>,
    /// UTC hour of the daily expiry sweep.
    pub expiry_sweep_hour: Option<u32>,
    /// UTC minute of the daily expiry sweep.
    pub expiry_sweep_minute: Option<u32>,
    /// Ceiling on one background job run.
    pub job_run_timeout_secs: Option<u64>,
    /// Ceiling on one membership mutation transaction.
    pub request_timeout_secs: Option<u64>,
    /// Upper bound on pooled PostgreSQL and Redis connections.
    pub db_max_connections: Option<u32>,
}

/// Settings that cannot be turned into a runnable configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid host {host:?}: expected an IP address")]
    InvalidHost { host: String },
    #[error("invalid expiry sweep time: {0}")]
    SweepTime(ScheduleError),
    #[error("invalid cache refresh interval: {0}")]
    RefreshInterval(ScheduleError),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: u64 },
}

fn positive_secs(value: Option<u64>, default: u64, field: &'static str) -> Result<Duration, SettingsError> {
    match value.unwrap_or(default) {
        0 => Err(SettingsError::Zero { field }),
        secs if secs > MAX_DURATION_SECS => Err(SettingsError::TooLarge {
            field,
            max: MAX_DURATION_SECS,
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

impl ServiceSettings {
    /// Validate the settings into a typed server configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] for an unparsable host, an out-of-range
    /// sweep time, or a duration that is zero or longer than a week.
    pub fn into_server_config(self) -> Result<ServerConfig, SettingsError> {
        let host = self.host.unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let ip: IpAddr = host
            .parse()
            .map_err(|_| SettingsError::InvalidHost { host: host.clone() })?;
        let bind_addr = SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT));

        let refresh = CacheRefreshConfig {
            interval: positive_secs(
                self.cache_refresh_interval_secs,
                DEFAULT_CACHE_REFRESH_INTERVAL_SECS,
                "cache_refresh_interval_secs",
            )?,
            ttl: positive_secs(self.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS, "cache_ttl_secs")?,
        };
        let refresh_schedule =
            Schedule::every(refresh.interval).map_err(SettingsError::RefreshInterval)?;
        let sweep_schedule = Schedule::daily_at(
            self.expiry_sweep_hour.unwrap_or(0),
            self.expiry_sweep_minute.unwrap_or(0),
        )
        .map_err(SettingsError::SweepTime)?;

        let idempotency = match self.idempotency_ttl_minutes {
            Some(0) => return Err(SettingsError::Zero { field: "idempotency_ttl_minutes" }),
            Some(minutes) => IdempotencyConfig::from_minutes(minutes),
            None => IdempotencyConfig::default(),
        };

        let max_connections = match self.db_max_connections {
            Some(0) => return Err(SettingsError::Zero { field: "db_max_connections" }),
            Some(size) => size,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(ServerConfig {
            bind_addr,
            database: self
                .database_url
                .map(|url| PoolConfig::new(url).with_max_size(max_connections)),
            redis: self.redis_url.map(|url| RedisConfig {
                url,
                max_connections,
            }),
            idempotency,
            refresh,
            refresh_schedule,
            sweep_schedule,
            job_run_timeout: positive_secs(
                self.job_run_timeout_secs,
                DEFAULT_JOB_RUN_TIMEOUT_SECS,
                "job_run_timeout_secs",
            )?,
            request_timeout: positive_secs(
                self.request_timeout_secs,
                DEFAULT_REQUEST_TIMEOUT_SECS,
                "request_timeout_secs",
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and validation.

    use super::*;
    use std::ffi::OsString;

    use chrono::NaiveTime;
    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 12] = [
        "SEGMENTS_HOST",
        "SEGMENTS_PORT",
        "SEGMENTS_DATABASE_URL",
        "SEGMENTS_REDIS_URL",
        "SEGMENTS_IDEMPOTENCY_TTL_MINUTES",
        "SEGMENTS_CACHE_TTL_SECS",
        "SEGMENTS_CACHE_REFRESH_INTERVAL_SECS",
        "SEGMENTS_EXPIRY_SWEEP_HOUR",
        "SEGMENTS_EXPIRY_SWEEP_MINUTE",
        "SEGMENTS_JOB_RUN_TIMEOUT_SECS",
        "SEGMENTS_REQUEST_TIMEOUT_SECS",
        "SEGMENTS_DB_MAX_CONNECTIONS",
    ];

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("segments")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_select_in_memory_adapters() {
        let _guard = lock_env(env_with(&[]));

        let config = load_from_empty_args()
            .into_server_config()
            .expect("defaults are valid");
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().expect("socket addr"));
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.idempotency.ttl(), Duration::from_secs(3600));
        assert_eq!(config.refresh, CacheRefreshConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.job_run_timeout, Duration::from_secs(600));
        assert_eq!(
            config.sweep_schedule,
            Schedule::DailyAt(NaiveTime::MIN)
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("SEGMENTS_PORT", "9090"),
            ("SEGMENTS_DATABASE_URL", "postgres://localhost/segments"),
            ("SEGMENTS_REDIS_URL", "redis://localhost:6379/0"),
            ("SEGMENTS_IDEMPOTENCY_TTL_MINUTES", "5"),
            ("SEGMENTS_EXPIRY_SWEEP_HOUR", "3"),
            ("SEGMENTS_EXPIRY_SWEEP_MINUTE", "15"),
            ("SEGMENTS_DB_MAX_CONNECTIONS", "4"),
        ]));

        let config = load_from_empty_args()
            .into_server_config()
            .expect("overrides are valid");
        assert_eq!(config.bind_addr.port(), 9090);
        let database = config.database.expect("database configured");
        assert_eq!(database.database_url(), "postgres://localhost/segments");
        assert_eq!(database.max_size(), 4);
        let redis = config.redis.expect("redis configured");
        assert_eq!(redis.max_connections, 4);
        assert_eq!(config.idempotency.ttl(), Duration::from_secs(300));
        assert_eq!(
            config.sweep_schedule,
            Schedule::daily_at(3, 15).expect("valid time")
        );
    }

    #[rstest]
    #[case("SEGMENTS_EXPIRY_SWEEP_HOUR", "24")]
    #[case("SEGMENTS_EXPIRY_SWEEP_MINUTE", "60")]
    #[case("SEGMENTS_CACHE_REFRESH_INTERVAL_SECS", "0")]
    #[case("SEGMENTS_REQUEST_TIMEOUT_SECS", "0")]
    #[case("SEGMENTS_HOST", "not-an-ip")]
    fn invalid_values_are_startup_errors(#[case] name: &'static str, #[case] value: &str) {
        let _guard = lock_env(env_with(&[(name, value)]));

        assert!(load_from_empty_args().into_server_config().is_err());
    }

    #[rstest]
    #[case("SEGMENTS_CACHE_TTL_SECS", "cache_ttl_secs")]
    #[case("SEGMENTS_JOB_RUN_TIMEOUT_SECS", "job_run_timeout_secs")]
    fn durations_beyond_a_week_are_rejected(
        #[case] name: &'static str,
        #[case] field: &'static str,
    ) {
        let _guard = lock_env(env_with(&[(name, "18446744073709551615")]));

        let err = load_from_empty_args()
            .into_server_config()
            .expect_err("oversized duration rejected");
        assert_eq!(
            err,
            SettingsError::TooLarge {
                field,
                max: MAX_DURATION_SECS,
            }
        );
    }

    #[rstest]
    fn a_week_long_cache_ttl_is_accepted() {
        let _guard = lock_env(env_with(&[("SEGMENTS_CACHE_TTL_SECS", "604800")]));

        let config = load_from_empty_args()
            .into_server_config()
            .expect("one week is within range");
        assert_eq!(config.refresh.ttl, Duration::from_secs(604_800));
    }
}
