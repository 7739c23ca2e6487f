//! Daily removal of memberships whose TTL has lapsed.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::MembershipRepository;
use crate::domain::{Error, ExpirySweepReport};

/// Runs one expiry sweep per call against the membership store.
///
/// The store executes the whole sweep in a single transaction, so a failed
/// run leaves expired rows in place for the next run.
#[derive(Clone)]
pub struct ExpirySweeper {
    repo: Arc<dyn MembershipRepository>,
    clock: Arc<dyn Clock>,
}

impl ExpirySweeper {
    pub fn new(repo: Arc<dyn MembershipRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Sweep memberships expiring on or before today (UTC).
    ///
    /// # Errors
    ///
    /// Returns `internal_error` when the store transaction fails.
    pub async fn run_once(&self) -> Result<ExpirySweepReport, Error> {
        let now = self.clock.utc();
        let report = self
            .repo
            .sweep_expired(now)
            .await
            .map_err(|err| Error::internal(format!("expiry sweep failed: {err}")))?;
        info!(
            expired = report.expired_memberships,
            users = report.affected_users,
            %now,
            "expiry sweep committed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MembershipStoreError, MockMembershipRepository};
    use crate::test_support::{FixtureClock, noon};

    #[rstest]
    #[tokio::test]
    async fn sweep_uses_clock_time() {
        let now = noon(2024, 5, 1);
        let mut repo = MockMembershipRepository::new();
        repo.expect_sweep_expired()
            .with(eq(now))
            .times(1)
            .return_once(|_| {
                Ok(ExpirySweepReport {
                    expired_memberships: 3,
                    affected_users: 2,
                })
            });

        let report = ExpirySweeper::new(Arc::new(repo), Arc::new(FixtureClock::at(now)))
            .run_once()
            .await
            .expect("sweep runs");
        assert_eq!(report.expired_memberships, 3);
        assert_eq!(report.affected_users, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failure_is_reported() {
        let mut repo = MockMembershipRepository::new();
        repo.expect_sweep_expired()
            .times(1)
            .return_once(|_| Err(MembershipStoreError::query("serialization failure")));

        let err = ExpirySweeper::new(Arc::new(repo), Arc::new(FixtureClock::at(noon(2024, 5, 1))))
            .run_once()
            .await
            .expect_err("sweep fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
