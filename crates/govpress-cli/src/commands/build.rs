use anyhow::anyhow;
use govpress_build::{BuildService, Trigger};
use govpress_config::{BuildConfig, validate};

use crate::cli::{BuildArgs, OutputFormat};
use crate::client::{CliError, CliResult, blocking, current_principal};
use crate::output::render_report;

pub(crate) async fn handle_build(
    config: BuildConfig,
    args: BuildArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let config = apply_overrides(config, args)?;
    let trigger = Trigger::Manual(current_principal(&config.operators));

    let report = blocking(move || BuildService::from_config(config)?.run(&trigger)).await?;
    render_report(&report, format)?;

    if report.success {
        Ok(())
    } else {
        let reason = report
            .error
            .as_ref()
            .map_or("unknown failure", |error| error.message.as_str());
        Err(CliError::failure(anyhow!(
            "build {} failed: {reason}",
            report.run_id
        )))
    }
}

fn apply_overrides(mut config: BuildConfig, args: BuildArgs) -> CliResult<BuildConfig> {
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(plugin_list) = args.plugin_list {
        config.plugin_list = plugin_list;
    }
    validate(&config).map_err(|err| CliError::validation(err.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn overrides_replace_configured_values() {
        let args = BuildArgs {
            name: Some("CityPress".to_string()),
            output_dir: Some(PathBuf::from("/srv/uploads")),
            plugin_list: None,
        };
        let config = match apply_overrides(BuildConfig::default(), args) {
            Ok(config) => config,
            Err(err) => panic!("overrides rejected: {}", err.display_message()),
        };
        assert_eq!(config.full_bundle_name(), "CityPress.zip");
        assert_eq!(config.plugins_bundle_name(), "CityPress-Plugins.zip");
        assert_eq!(config.output_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(config.plugin_list, BuildConfig::default().plugin_list);
    }

    #[test]
    fn invalid_name_override_is_rejected() {
        let args = BuildArgs {
            name: Some("   ".to_string()),
            ..BuildArgs::default()
        };
        let err = apply_overrides(BuildConfig::default(), args).err();
        assert!(err.is_some_and(|err| err.exit_code() == 2));
    }
}
