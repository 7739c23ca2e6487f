//! [`PeriodicTask`] bindings for the domain background services.

use async_trait::async_trait;

use crate::domain::{CacheRefresher, Error, ExpirySweeper};

use super::PeriodicTask;

#[async_trait]
impl PeriodicTask for ExpirySweeper {
    fn name(&self) -> &'static str {
        "membership_expiry_sweep"
    }

    async fn run(&self) -> Result<(), Error> {
        self.run_once().await.map(drop)
    }
}

#[async_trait]
impl PeriodicTask for CacheRefresher {
    fn name(&self) -> &'static str {
        "segment_cache_refresh"
    }

    async fn run(&self) -> Result<(), Error> {
        self.refresh_all().await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::domain::ExpirySweepReport;
    use crate::domain::ports::{MembershipStoreError, MockMembershipRepository};
    use crate::test_support::{FixtureClock, noon};

    #[rstest]
    #[tokio::test]
    async fn sweeper_task_discards_report() {
        let mut repo = MockMembershipRepository::new();
        repo.expect_sweep_expired()
            .times(1)
            .return_once(|_| Ok(ExpirySweepReport::default()));
        let task: Arc<dyn PeriodicTask> = Arc::new(ExpirySweeper::new(
            Arc::new(repo),
            Arc::new(FixtureClock::at(noon(2024, 1, 1))),
        ));

        assert_eq!(task.name(), "membership_expiry_sweep");
        task.run().await.expect("sweep succeeds");
    }

    #[rstest]
    #[tokio::test]
    async fn sweeper_task_surfaces_failure() {
        let mut repo = MockMembershipRepository::new();
        repo.expect_sweep_expired()
            .times(1)
            .return_once(|_| Err(MembershipStoreError::connection("gone")));
        let task = ExpirySweeper::new(Arc::new(repo), Arc::new(FixtureClock::at(noon(2024, 1, 1))));

        assert!(PeriodicTask::run(&task).await.is_err());
    }
}
