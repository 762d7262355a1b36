//! Recurring job runner on the tokio runtime.
//!
//! Each registered job owns one task that ticks on a fixed interval and runs the
//! callback on the blocking pool. A tick that arrives while the previous run is
//! still going is delayed rather than stacked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use govpress_build::{BuildError, BuildResult, JobCallback, RecurringJob, Scheduler};
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub(crate) struct TokioScheduler {
    runtime: Handle,
    jobs: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioScheduler {
    /// Scheduler bound to the current runtime; must be called from within one.
    pub(crate) fn new() -> Self {
        Self {
            runtime: Handle::current(),
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn register(&self, job: RecurringJob) -> BuildResult<()> {
        let mut jobs = self.jobs.lock().map_err(|_| BuildError::Scheduler {
            job: job.name.clone(),
            reason: "registry_poisoned",
        })?;
        if jobs.contains_key(&job.name) {
            return Err(BuildError::Scheduler {
                job: job.name,
                reason: "already_registered",
            });
        }
        if job.interval.is_zero() {
            return Err(BuildError::Scheduler {
                job: job.name,
                reason: "zero_interval",
            });
        }

        let handle = self.runtime.spawn(drive(
            job.name.clone(),
            job.interval,
            job.run_on_start,
            job.callback,
        ));
        jobs.insert(job.name, handle);
        Ok(())
    }

    fn unregister(&self, name: &str) -> BuildResult<bool> {
        let mut jobs = self.jobs.lock().map_err(|_| BuildError::Scheduler {
            job: name.to_string(),
            reason: "registry_poisoned",
        })?;
        Ok(jobs.remove(name).is_some_and(|handle| {
            handle.abort();
            true
        }))
    }

    fn is_registered(&self, name: &str) -> bool {
        self.jobs
            .lock()
            .is_ok_and(|jobs| jobs.contains_key(name))
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(jobs) = self.jobs.get_mut() {
            for (_, handle) in jobs.drain() {
                handle.abort();
            }
        }
    }
}

async fn drive(name: String, period: Duration, run_on_start: bool, callback: JobCallback) {
    let first = if run_on_start {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        debug!(job = %name, "job tick");
        let callback = Arc::clone(&callback);
        if let Err(err) = task::spawn_blocking(move || callback()).await {
            warn!(job = %name, error = %err, "job run aborted");
        }
    }
}
