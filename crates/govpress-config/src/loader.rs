//! Configuration loading: defaults, optional TOML file, then environment overrides.
//!
//! # Design
//! - Environment access goes through a lookup closure so tests never mutate process state.
//! - Relative paths in a file resolve against the file's directory; overrides are taken as given.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{BuildConfig, LogFormatSetting};
use crate::validate::validate;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "GOVPRESS_CONFIG";

const ENV_NAME: &str = "GOVPRESS_NAME";
const ENV_WORKING_DIR: &str = "GOVPRESS_WORKING_DIR";
const ENV_OUTPUT_DIR: &str = "GOVPRESS_OUTPUT_DIR";
const ENV_PLUGIN_LIST: &str = "GOVPRESS_PLUGIN_LIST";
const ENV_CORE_URL: &str = "GOVPRESS_CORE_URL";
const ENV_THEME_URL: &str = "GOVPRESS_THEME_URL";
const ENV_PLUGIN_API: &str = "GOVPRESS_PLUGIN_API";
const ENV_LOG_LEVEL: &str = "GOVPRESS_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "GOVPRESS_LOG_FORMAT";

/// Load configuration from the process environment.
///
/// `path` takes precedence over `GOVPRESS_CONFIG`; with neither, defaults are used.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or the merged result is invalid.
pub fn load(path: Option<&Path>) -> ConfigResult<BuildConfig> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using a caller-supplied environment lookup.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or the merged result is invalid.
pub fn load_with_env<F>(path: Option<&Path>, env: F) -> ConfigResult<BuildConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file_path = path.map(Path::to_path_buf).or_else(|| {
        env(CONFIG_PATH_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    });

    let mut config = match file_path {
        Some(file_path) => load_file(&file_path)?,
        None => BuildConfig::default(),
    };

    apply_env_overrides(&mut config, &env)?;
    validate(&config)?;
    Ok(config)
}

/// Parse a configuration file and resolve its relative paths.
///
/// # Errors
///
/// Returns an error when the file cannot be read or does not match the schema.
pub fn load_file(path: &Path) -> ConfigResult<BuildConfig> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config = parse_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(base) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        config.plugin_list = resolve_relative(base, &config.plugin_list);
        config.working_dir = resolve_relative(base, &config.working_dir);
        config.output_dir = resolve_relative(base, &config.output_dir);
    }
    debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

fn parse_str(contents: &str) -> Result<BuildConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn resolve_relative(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

fn apply_env_overrides<F>(config: &mut BuildConfig, env: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = lookup(ENV_NAME) {
        config.name = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_WORKING_DIR) {
        config.working_dir = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_OUTPUT_DIR) {
        config.output_dir = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_PLUGIN_LIST) {
        config.plugin_list = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_CORE_URL) {
        config.core_url = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_THEME_URL) {
        config.theme_url = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_PLUGIN_API) {
        config.plugin_api = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = value.trim().to_string();
    }
    if let Some(value) = lookup(ENV_LOG_FORMAT) {
        let format = LogFormatSetting::parse(&value).ok_or_else(|| {
            ConfigError::invalid(
                "logging.format",
                "must be 'json' or 'pretty'",
                Some(value.clone()),
            )
        })?;
        config.logging.format = Some(format);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_and_env_yield_defaults() -> anyhow::Result<()> {
        let config = load_with_env(None, env_from(&[]))?;
        assert_eq!(config, BuildConfig::default());
        Ok(())
    }

    #[test]
    fn env_overrides_replace_defaults() -> anyhow::Result<()> {
        let config = load_with_env(
            None,
            env_from(&[
                (ENV_NAME, "CityPress"),
                (ENV_WORKING_DIR, "/tmp/city/upgrade"),
                (ENV_OUTPUT_DIR, "/tmp/city/uploads"),
                (ENV_LOG_FORMAT, "json"),
            ]),
        )?;
        assert_eq!(config.name, "CityPress");
        assert_eq!(config.working_dir, PathBuf::from("/tmp/city/upgrade"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/city/uploads"));
        assert_eq!(config.logging.format, Some(LogFormatSetting::Json));
        Ok(())
    }

    #[test]
    fn blank_env_values_are_ignored() -> anyhow::Result<()> {
        let config = load_with_env(None, env_from(&[(ENV_NAME, "   ")]))?;
        assert_eq!(config.name, "GovPress");
        Ok(())
    }

    #[test]
    fn invalid_log_format_is_rejected() {
        let result = load_with_env(None, env_from(&[(ENV_LOG_FORMAT, "xml")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField {
                field: "logging.format",
                ..
            })
        ));
    }

    #[test]
    fn partial_toml_keeps_section_defaults() -> anyhow::Result<()> {
        let config = parse_str(
            r#"
            name = "CountyPress"

            [layout]
            theme_prefix = "county"
            "#,
        )?;
        assert_eq!(config.name, "CountyPress");
        assert_eq!(config.layout.theme_prefix, "county");
        assert_eq!(config.layout.core_folder, "wordpress");
        assert_eq!(config.schedule.interval_secs, 86_400);
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse_str("colour = \"blue\"").is_err());
    }
}
