//! Validation helpers for loaded configuration.

use std::path::{Component, Path};

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{BuildConfig, MetadataConfig};

/// Check a fully merged configuration before it reaches the pipeline.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first field that fails.
pub fn validate(config: &BuildConfig) -> ConfigResult<()> {
    validate_name(&config.name)?;
    validate_http_url("plugin_api", &config.plugin_api)?;
    require_non_empty("core_url", &config.core_url)?;
    require_non_empty("theme_url", &config.theme_url)?;
    require_non_empty_path("plugin_list", &config.plugin_list)?;
    require_non_empty_path("working_dir", &config.working_dir)?;
    require_non_empty_path("output_dir", &config.output_dir)?;
    validate_directories(config)?;

    validate_segment("layout.core_folder", &config.layout.core_folder)?;
    validate_segment("layout.content_dir", &config.layout.content_dir)?;
    validate_segment("layout.theme_folder", &config.layout.theme_folder)?;
    require_non_empty("layout.theme_prefix", &config.layout.theme_prefix)?;
    for entry in &config.layout.prune {
        validate_segment("layout.prune", entry)?;
    }

    if config.metadata.fields.get(MetadataConfig::DOWNLOAD_LINK_FIELD) != Some(&true) {
        return Err(ConfigError::invalid(
            "metadata.fields",
            "download link field must be requested",
            Some(MetadataConfig::DOWNLOAD_LINK_FIELD.to_string()),
        ));
    }

    if config.http.connect_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "http.connect_timeout_secs",
            "must be positive",
            Some("0".to_string()),
        ));
    }
    if config.http.timeout_secs == Some(0) {
        return Err(ConfigError::invalid(
            "http.timeout_secs",
            "must be positive when set",
            Some("0".to_string()),
        ));
    }
    if config.schedule.interval_secs == 0 {
        return Err(ConfigError::invalid(
            "schedule.interval_secs",
            "must be positive",
            Some("0".to_string()),
        ));
    }
    require_non_empty("logging.level", &config.logging.level)?;

    Ok(())
}

fn validate_name(name: &str) -> ConfigResult<()> {
    require_non_empty("name", name)?;
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::invalid(
            "name",
            "must be usable as a file name",
            Some(name.to_string()),
        ));
    }
    Ok(())
}

fn validate_http_url(field: &'static str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value.trim()).map_err(|_| {
        ConfigError::invalid(field, "must be an absolute URL", Some(value.to_string()))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ConfigError::invalid(
            field,
            "must use http or https",
            Some(value.to_string()),
        )),
    }
}

fn validate_directories(config: &BuildConfig) -> ConfigResult<()> {
    let working = &config.working_dir;
    let output = &config.output_dir;
    if working == output {
        return Err(ConfigError::invalid(
            "output_dir",
            "must differ from working_dir",
            Some(output.display().to_string()),
        ));
    }
    if output.starts_with(working) {
        return Err(ConfigError::invalid(
            "output_dir",
            "must not live inside working_dir",
            Some(output.display().to_string()),
        ));
    }
    if config.lock_path().starts_with(working) {
        return Err(ConfigError::invalid(
            "working_dir",
            "must have a parent directory for the run lock",
            Some(working.display().to_string()),
        ));
    }
    Ok(())
}

fn validate_segment(field: &'static str, value: &str) -> ConfigResult<()> {
    require_non_empty(field, value)?;
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::invalid(
            field,
            "must be a single path segment",
            Some(value.to_string()),
        )),
    }
}

fn require_non_empty(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty", None));
    }
    Ok(())
}

fn require_non_empty_path(field: &'static str, value: &Path) -> ConfigResult<()> {
    if value.as_os_str().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty", None));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn assert_invalid(config: &BuildConfig, expected_field: &str) {
        match validate(config) {
            Err(ConfigError::InvalidField { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid '{expected_field}', got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&BuildConfig::default()).is_ok());
    }

    #[test]
    fn rejects_name_with_separator() {
        let config = BuildConfig {
            name: "Gov/Press".to_string(),
            ..BuildConfig::default()
        };
        assert_invalid(&config, "name");
    }

    #[test]
    fn rejects_non_http_plugin_api() {
        let config = BuildConfig {
            plugin_api: "ftp://api.example.org/".to_string(),
            ..BuildConfig::default()
        };
        assert_invalid(&config, "plugin_api");
    }

    #[test]
    fn allows_local_core_location() {
        let config = BuildConfig {
            core_url: "/srv/mirror/latest.zip".to_string(),
            ..BuildConfig::default()
        };
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_output_inside_working_dir() {
        let config = BuildConfig {
            working_dir: PathBuf::from("/srv/govpress/upgrade"),
            output_dir: PathBuf::from("/srv/govpress/upgrade/public"),
            ..BuildConfig::default()
        };
        assert_invalid(&config, "output_dir");
    }

    #[test]
    fn rejects_nested_prune_entry() {
        let mut config = BuildConfig::default();
        config.layout.prune.push("akismet/akismet.php".to_string());
        assert_invalid(&config, "layout.prune");
    }

    #[test]
    fn rejects_disabled_download_link_field() {
        let mut config = BuildConfig::default();
        config
            .metadata
            .fields
            .insert(MetadataConfig::DOWNLOAD_LINK_FIELD.to_string(), false);
        assert_invalid(&config, "metadata.fields");
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = BuildConfig::default();
        config.schedule.interval_secs = 0;
        assert_invalid(&config, "schedule.interval_secs");
    }
}
