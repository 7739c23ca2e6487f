//! Spawns periodic tasks and owns their shutdown signal.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt as _;
use mockable::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep, timeout};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::TraceId;

use super::{PeriodicTask, Schedule};

/// Default ceiling on a single run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(600);

/// Starts periodic tasks on the current tokio runtime.
#[derive(Clone)]
pub struct JobScheduler {
    clock: Arc<dyn Clock>,
    run_timeout: Duration,
}

/// A running job. Dropping the handle detaches the job; call
/// [`JobHandle::stop`] to end it.
#[derive(Debug)]
pub struct JobHandle {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl JobScheduler {
    /// Scheduler reading wall-clock time from `clock` for daily schedules.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Override the per-run timeout.
    #[must_use]
    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Run `task` on `schedule` until the returned handle is stopped.
    pub fn spawn(&self, task: Arc<dyn PeriodicTask>, schedule: Schedule) -> JobHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let name = task.name();
        let runner = JobRunner {
            task,
            clock: Arc::clone(&self.clock),
            run_timeout: self.run_timeout,
        };
        info!(job = name, ?schedule, "starting periodic job");
        let join = tokio::spawn(runner.run_loop(schedule, shutdown_rx));
        JobHandle {
            name,
            shutdown,
            join,
        }
    }
}

impl JobHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal shutdown and wait for the loop to exit.
    ///
    /// A run already in progress completes (or times out) first.
    pub async fn stop(self) {
        if self.shutdown.send(true).is_err() {
            debug!(job = self.name, "job loop already exited");
        }
        if let Err(err) = self.join.await {
            warn!(job = self.name, error = %err, "job task ended abnormally");
        }
        info!(job = self.name, "periodic job stopped");
    }
}

struct JobRunner {
    task: Arc<dyn PeriodicTask>,
    clock: Arc<dyn Clock>,
    run_timeout: Duration,
}

fn shutdown_requested(changed: Result<(), watch::error::RecvError>, rx: &watch::Receiver<bool>) -> bool {
    changed.is_err() || *rx.borrow()
}

impl JobRunner {
    async fn run_loop(self, schedule: Schedule, mut shutdown: watch::Receiver<bool>) {
        match schedule {
            Schedule::Every(period) => {
                let mut ticker = interval(period.max(Duration::from_millis(1)));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if shutdown_requested(changed, &shutdown) {
                                break;
                            }
                        }
                        _ = ticker.tick() => self.run_once().await,
                    }
                }
            }
            Schedule::DailyAt(_) => loop {
                let delay = schedule.next_delay(self.clock.utc());
                debug!(job = self.task.name(), ?delay, "waiting for next daily run");
                tokio::select! {
                    changed = shutdown.changed() => {
                        if shutdown_requested(changed, &shutdown) {
                            break;
                        }
                    }
                    () = sleep(delay) => self.run_once().await,
                }
            },
        }
    }

    async fn run_once(&self) {
        let trace_id = TraceId::generate();
        let span = info_span!("job_run", job = self.task.name(), %trace_id);
        let run_timeout = self.run_timeout;
        let run = async {
            match AssertUnwindSafe(timeout(run_timeout, self.task.run()))
                .catch_unwind()
                .await
            {
                Ok(Ok(Ok(()))) => debug!("job run finished"),
                Ok(Ok(Err(err))) => error!(error = %err, "job run failed"),
                Ok(Err(_)) => error!(timeout = ?run_timeout, "job run timed out"),
                Err(_) => error!("job run panicked"),
            }
        };
        TraceId::scope(trace_id, run.instrument(span)).await;
    }
}
