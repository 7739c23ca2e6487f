//! Periodic background jobs.
//!
//! A [`PeriodicTask`] is one unit of recurring work. [`JobScheduler`] runs
//! it on a [`Schedule`] in its own tokio task, bounding every run with a
//! timeout and logging failures instead of propagating them. The returned
//! [`JobHandle`] stops the loop.

mod schedule;
mod scheduler;
mod tasks;

pub use schedule::{Schedule, ScheduleError};
pub use scheduler::{DEFAULT_RUN_TIMEOUT, JobHandle, JobScheduler};

use async_trait::async_trait;

use crate::domain::Error;

/// Recurring work driven by [`JobScheduler`].
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Perform one run.
    async fn run(&self) -> Result<(), Error>;
}
