use govpress_build::BuildService;
use govpress_config::BuildConfig;

use crate::cli::{OutputFormat, ResolveArgs};
use crate::client::{CliError, CliResult, blocking};
use crate::output::render_link;

pub(crate) async fn handle_resolve(
    config: BuildConfig,
    args: ResolveArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let slug = args.slug.trim().to_string();
    if slug.is_empty() {
        return Err(CliError::validation("plugin slug must not be empty"));
    }

    let lookup = slug.clone();
    let link = blocking(move || BuildService::from_config(config)?.resolve_plugin(&lookup)).await?;
    render_link(&slug, &link, format)
}
