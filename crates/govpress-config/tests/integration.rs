use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use govpress_config::{ConfigError, load_file, load_with_env};

#[test]
fn file_paths_resolve_against_the_config_directory() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let config_path = temp.path().join("govpress.toml");
    fs::write(
        &config_path,
        r#"
name = "StatePress"
plugin_list = "lists/plugins.txt"
working_dir = "work/upgrade"
output_dir = "/var/www/uploads"
operators = ["deploy"]

[schedule]
interval_secs = 3600
run_on_start = true
"#,
    )?;

    let config = load_with_env(Some(&config_path), |_| None)?;
    assert_eq!(config.name, "StatePress");
    assert_eq!(config.plugin_list, temp.path().join("lists/plugins.txt"));
    assert_eq!(config.working_dir, temp.path().join("work/upgrade"));
    assert_eq!(config.output_dir, PathBuf::from("/var/www/uploads"));
    assert_eq!(config.operators, vec!["deploy".to_string()]);
    assert!(config.schedule.run_on_start);
    assert_eq!(config.schedule.interval_secs, 3600);
    Ok(())
}

#[test]
fn config_path_can_come_from_the_environment() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let config_path = temp.path().join("env.toml");
    fs::write(&config_path, "name = \"EnvPress\"\n")?;
    let location = config_path.display().to_string();

    let config = load_with_env(None, move |key| {
        (key == govpress_config::CONFIG_PATH_ENV).then(|| location.clone())
    })?;
    assert_eq!(config.name, "EnvPress");
    Ok(())
}

#[test]
fn missing_file_reports_io_error() {
    let result = load_file(&PathBuf::from("/definitely/missing/govpress.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn malformed_file_reports_parse_error() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let config_path = temp.path().join("broken.toml");
    fs::write(&config_path, "name = [")?;
    assert!(matches!(
        load_file(&config_path),
        Err(ConfigError::Parse { .. })
    ));
    Ok(())
}
