//! Scheduler interface and the daily build job.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use govpress_config::ScheduleConfig;

use crate::error::BuildResult;
use crate::service::BuildService;
use crate::trigger::Trigger;

/// Name of the recurring bundle build job.
pub const DAILY_BUILD_JOB: &str = "govpress_daily_build";

/// Callback invoked on every tick of a job.
pub type JobCallback = Arc<dyn Fn() + Send + Sync>;

/// Recurring job definition.
#[derive(Clone)]
pub struct RecurringJob {
    /// Unique job name.
    pub name: String,
    /// Time between runs.
    pub interval: Duration,
    /// Run once immediately on registration.
    pub run_on_start: bool,
    /// Work to perform.
    pub callback: JobCallback,
}

impl fmt::Debug for RecurringJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecurringJob")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("run_on_start", &self.run_on_start)
            .finish_non_exhaustive()
    }
}

/// Registers and removes recurring jobs.
pub trait Scheduler: Send + Sync {
    /// Register `job`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Scheduler` when a job with the same name exists.
    fn register(&self, job: RecurringJob) -> BuildResult<()>;

    /// Remove the job named `name`; `Ok(false)` when it was not registered.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Scheduler` when the job cannot be stopped.
    fn unregister(&self, name: &str) -> BuildResult<bool>;

    /// Whether a job named `name` is registered.
    fn is_registered(&self, name: &str) -> bool;
}

/// Job running one scheduled build per tick.
#[must_use]
pub fn daily_build_job(service: Arc<BuildService>, schedule: &ScheduleConfig) -> RecurringJob {
    let callback: JobCallback = Arc::new(move || match service.run(&Trigger::Scheduled) {
        Ok(report) if report.success => info!(run_id = %report.run_id, "scheduled build finished"),
        Ok(report) => warn!(run_id = %report.run_id, "scheduled build failed"),
        Err(err) => warn!(error = %err.describe(), "scheduled build not started"),
    });
    RecurringJob {
        name: DAILY_BUILD_JOB.to_string(),
        interval: schedule.interval(),
        run_on_start: schedule.run_on_start,
        callback,
    }
}

/// Register the daily build unless it is already registered; returns whether it was added.
///
/// # Errors
///
/// Propagates scheduler registration failures.
pub fn register_daily_build(
    scheduler: &dyn Scheduler,
    service: Arc<BuildService>,
    schedule: &ScheduleConfig,
) -> BuildResult<bool> {
    if scheduler.is_registered(DAILY_BUILD_JOB) {
        return Ok(false);
    }
    scheduler.register(daily_build_job(service, schedule))?;
    info!(
        job = DAILY_BUILD_JOB,
        interval_secs = schedule.interval_secs,
        "build job registered"
    );
    Ok(true)
}

/// Remove the daily build; returns whether it was registered.
///
/// # Errors
///
/// Propagates scheduler failures.
pub fn unregister_daily_build(scheduler: &dyn Scheduler) -> BuildResult<bool> {
    let removed = scheduler.unregister(DAILY_BUILD_JOB)?;
    if removed {
        info!(job = DAILY_BUILD_JOB, "build job unregistered");
    }
    Ok(removed)
}
