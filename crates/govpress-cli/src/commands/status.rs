use govpress_build::last_report;
use govpress_config::BuildConfig;

use crate::cli::OutputFormat;
use crate::client::{CliResult, blocking};
use crate::output::render_status;

pub(crate) async fn handle_status(config: BuildConfig, format: OutputFormat) -> CliResult<()> {
    let report = blocking(move || last_report(&config)).await?;
    render_status(report.as_ref(), format)
}
