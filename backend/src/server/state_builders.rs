//! Builders for driven adapters, HTTP state and background jobs.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::Clock;
use tracing::{info, warn};

use segments::domain::ports::{
    HistoryRepository, IdempotencyStore, MembershipRepository, SegmentCache, SegmentRepository,
    UserRepository,
};
use segments::domain::{
    CacheRefresher, CatalogueService, ExpirySweeper, IdempotencyGuard, MembershipService,
};
use segments::inbound::http::state::{HttpState, HttpStatePorts};
use segments::jobs::{JobHandle, JobScheduler};
use segments::outbound::cache::{RedisIdempotencyStore, RedisPool, RedisSegmentCache};
use segments::outbound::memory::{MemoryIdempotencyStore, MemoryMembershipStore, MemorySegmentCache};
use segments::outbound::persistence::{
    DbPool, DieselHistoryRepository, DieselMembershipRepository, DieselSegmentRepository,
    DieselUserRepository, run_pending_migrations,
};

use super::ServerConfig;

/// Driven adapters selected from configuration.
#[derive(Clone)]
pub(super) struct Stores {
    pub memberships: Arc<dyn MembershipRepository>,
    pub segments: Arc<dyn SegmentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub cache: Arc<dyn SegmentCache>,
    pub idempotency: Arc<dyn IdempotencyStore>,
}

type RelationalStores = (
    Arc<dyn MembershipRepository>,
    Arc<dyn SegmentRepository>,
    Arc<dyn UserRepository>,
    Arc<dyn HistoryRepository>,
);

async fn build_relational_stores(config: &ServerConfig) -> io::Result<RelationalStores> {
    let Some(pool_config) = config.database.clone() else {
        warn!("no database configured; memberships are kept in memory");
        let store = Arc::new(MemoryMembershipStore::new());
        let memberships: Arc<dyn MembershipRepository> = store.clone();
        let segments: Arc<dyn SegmentRepository> = store.clone();
        let users: Arc<dyn UserRepository> = store.clone();
        let history: Arc<dyn HistoryRepository> = store;
        return Ok((memberships, segments, users, history));
    };

    run_pending_migrations(pool_config.database_url())
        .await
        .map_err(|err| io::Error::other(err.to_string()))?;
    let pool = DbPool::new(pool_config)
        .await
        .map_err(|err| io::Error::other(err.into_message()))?;
    info!("connected to PostgreSQL");
    let memberships: Arc<dyn MembershipRepository> =
        Arc::new(DieselMembershipRepository::new(pool.clone()));
    let segments: Arc<dyn SegmentRepository> = Arc::new(DieselSegmentRepository::new(pool.clone()));
    let users: Arc<dyn UserRepository> = Arc::new(DieselUserRepository::new(pool.clone()));
    let history: Arc<dyn HistoryRepository> = Arc::new(DieselHistoryRepository::new(pool));
    Ok((memberships, segments, users, history))
}

async fn build_key_value_stores(
    config: &ServerConfig,
) -> io::Result<(Arc<dyn SegmentCache>, Arc<dyn IdempotencyStore>)> {
    let Some(redis) = &config.redis else {
        warn!("no redis configured; cache and idempotency markers are kept in memory");
        let cache: Arc<dyn SegmentCache> = Arc::new(MemorySegmentCache::new());
        let markers: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
        return Ok((cache, markers));
    };

    let pool = RedisPool::connect(&redis.url, redis.max_connections)
        .await
        .map_err(|err| io::Error::other(err.to_string()))?;
    info!("connected to Redis");
    let cache: Arc<dyn SegmentCache> = Arc::new(RedisSegmentCache::new(pool.clone()));
    let markers: Arc<dyn IdempotencyStore> = Arc::new(RedisIdempotencyStore::new(pool));
    Ok((cache, markers))
}

/// Connect to the configured stores, applying migrations first.
///
/// # Errors
///
/// Fails when a configured database or Redis server is unreachable or a
/// migration cannot be applied.
pub(super) async fn build_stores(config: &ServerConfig) -> io::Result<Stores> {
    let (memberships, segments, users, history) = build_relational_stores(config).await?;
    let (cache, idempotency) = build_key_value_stores(config).await?;
    Ok(Stores {
        memberships,
        segments,
        users,
        history,
        cache,
        idempotency,
    })
}

/// Build the shared HTTP state over `stores`.
pub(super) fn build_http_state(
    stores: &Stores,
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> web::Data<HttpState> {
    let memberships = Arc::new(
        MembershipService::new(
            Arc::clone(&stores.memberships),
            Arc::clone(&stores.cache),
            clock,
        )
        .with_request_timeout(config.request_timeout),
    );
    let catalogue = Arc::new(CatalogueService::new(
        Arc::clone(&stores.segments),
        Arc::clone(&stores.users),
        Arc::clone(&stores.history),
    ));
    let guard = IdempotencyGuard::new(Arc::clone(&stores.idempotency), config.idempotency);

    web::Data::new(HttpState::new(
        HttpStatePorts {
            memberships: memberships.clone(),
            memberships_query: memberships,
            segments: catalogue.clone(),
            users: catalogue.clone(),
            history: catalogue,
        },
        guard,
    ))
}

/// Start the expiry sweep and the cache refresher.
pub(super) fn start_jobs(
    stores: &Stores,
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> Vec<JobHandle> {
    let scheduler = JobScheduler::new(Arc::clone(&clock)).with_run_timeout(config.job_run_timeout);
    let sweeper = Arc::new(ExpirySweeper::new(Arc::clone(&stores.memberships), clock));
    let refresher = Arc::new(CacheRefresher::new(
        Arc::clone(&stores.memberships),
        Arc::clone(&stores.cache),
        config.refresh,
    ));
    vec![
        scheduler.spawn(sweeper, config.sweep_schedule),
        scheduler.spawn(refresher, config.refresh_schedule),
    ]
}
