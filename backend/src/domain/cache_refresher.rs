//! Background repopulation of the per-user membership cache.
//!
//! Each cycle lists every user holding a membership row, re-reads their
//! memberships from the store and overwrites the cached snapshot. Users
//! that dropped out since the previous cycle get an empty snapshot. A user
//! whose refresh fails keeps whatever entry they had until it expires.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Error, UserId, UserSegments};
use crate::domain::ports::{MembershipRepository, SegmentCache, SegmentCacheKey};

/// Default time between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Default lifetime of a cached snapshot.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Refresh cadence and snapshot lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheRefreshConfig {
    pub interval: Duration,
    pub ttl: Duration,
}

impl Default for CacheRefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Per-cycle counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    /// Users cached by an earlier cycle who no longer hold any membership.
    pub cleared: usize,
    pub failed: usize,
}

/// Rebuilds cache entries from the membership store.
///
/// Clones share the record of which users were cached, so a user whose
/// last membership disappears gets an empty snapshot on the next cycle
/// instead of keeping a stale one until it expires.
#[derive(Clone)]
pub struct CacheRefresher {
    repo: Arc<dyn MembershipRepository>,
    cache: Arc<dyn SegmentCache>,
    config: CacheRefreshConfig,
    known_users: Arc<Mutex<BTreeSet<UserId>>>,
}

impl CacheRefresher {
    pub fn new(
        repo: Arc<dyn MembershipRepository>,
        cache: Arc<dyn SegmentCache>,
        config: CacheRefreshConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            config,
            known_users: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    pub fn config(&self) -> CacheRefreshConfig {
        self.config
    }

    async fn store(&self, snapshot: &UserSegments) -> bool {
        let key = SegmentCacheKey::for_user(snapshot.user_id);
        match self.cache.put(&key, snapshot, self.config.ttl).await {
            Ok(()) => true,
            Err(err) => {
                warn!(user_id = %snapshot.user_id, error = %err, "failed to write segment cache entry");
                false
            }
        }
    }

    /// Run one refresh cycle.
    ///
    /// Cycles are serialised; a second call waits for the first to finish.
    ///
    /// # Errors
    ///
    /// Returns `internal_error` only when the member list cannot be read;
    /// per-user failures are counted in the report instead.
    pub async fn refresh_all(&self) -> Result<RefreshReport, Error> {
        let mut known = self.known_users.lock().await;
        let listed: BTreeSet<UserId> = self
            .repo
            .list_member_user_ids()
            .await
            .map_err(|err| Error::internal(format!("failed to list cached users: {err}")))?
            .into_iter()
            .collect();

        let mut report = RefreshReport::default();
        let mut next_known = listed.clone();
        for &user_id in &listed {
            let snapshot = match self.repo.find_user_segments(user_id).await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    debug!(%user_id, "memberships vanished before refresh");
                    UserSegments::new(user_id, Vec::new())
                }
                Err(err) => {
                    warn!(%user_id, error = %err, "failed to read memberships for cache refresh");
                    report.failed += 1;
                    continue;
                }
            };
            if self.store(&snapshot).await {
                report.refreshed += 1;
            } else {
                report.failed += 1;
            }
        }

        for &user_id in known.difference(&listed) {
            if self.store(&UserSegments::new(user_id, Vec::new())).await {
                report.cleared += 1;
            } else {
                report.failed += 1;
                next_known.insert(user_id);
            }
        }
        *known = next_known;

        info!(
            refreshed = report.refreshed,
            cleared = report.cleared,
            failed = report.failed,
            "segment cache refreshed"
        );
        Ok(report)
    }
}
