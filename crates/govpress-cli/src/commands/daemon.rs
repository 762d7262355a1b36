use std::sync::Arc;

use anyhow::anyhow;
use govpress_build::{BuildService, register_daily_build, unregister_daily_build};
use govpress_config::BuildConfig;
use tracing::info;

use crate::cli::DaemonArgs;
use crate::client::{CliError, CliResult, blocking};
use crate::scheduler::TokioScheduler;

pub(crate) async fn handle_daemon(mut config: BuildConfig, args: DaemonArgs) -> CliResult<()> {
    if args.run_on_start {
        config.schedule.run_on_start = true;
    }
    let schedule = config.schedule.clone();
    let service = Arc::new(blocking(move || BuildService::from_config(config)).await?);

    let scheduler = TokioScheduler::new();
    register_daily_build(&scheduler, Arc::clone(&service), &schedule)?;
    info!(
        interval_secs = schedule.interval_secs,
        run_on_start = schedule.run_on_start,
        "daemon started"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| CliError::failure(anyhow!("failed to wait for shutdown signal: {err}")))?;

    unregister_daily_build(&scheduler)?;
    info!("daemon stopped");
    // The blocking HTTP client shuts down its own runtime on drop.
    blocking(move || {
        drop(service);
        Ok(())
    })
    .await
}
