//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; loading lives in `loader.rs`, checks in `validate.rs`.
//! - Every section defaults to the public GovPress sources so an empty file
//!   (or no file) yields a working configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration for one bundle builder instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Bundle name used for `<name>.zip` and `<name>-Plugins.zip`.
    pub name: String,
    /// Plugin information endpoint queried for download links.
    pub plugin_api: String,
    /// Fixed location of the core archive (URL or local path).
    pub core_url: String,
    /// Fixed location of the theme archive (URL or local path).
    pub theme_url: String,
    /// Curated plugin list, one slug per line.
    pub plugin_list: PathBuf,
    /// Scratch directory owned by one run at a time.
    pub working_dir: PathBuf,
    /// Public directory receiving the finished bundles.
    pub output_dir: PathBuf,
    /// Folder layout inside the working directory.
    pub layout: LayoutConfig,
    /// Plugin metadata request options.
    pub metadata: MetadataConfig,
    /// HTTP client options.
    pub http: HttpConfig,
    /// Recurring build schedule.
    pub schedule: ScheduleConfig,
    /// Keep local package files after extraction instead of deleting them.
    pub keep_local_packages: bool,
    /// Users allowed to trigger a manual build in addition to root.
    pub operators: Vec<String>,
    /// Logging options.
    pub logging: LoggingSettings,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            name: defaults::BUNDLE_NAME.to_string(),
            plugin_api: defaults::PLUGIN_API.to_string(),
            core_url: defaults::CORE_URL.to_string(),
            theme_url: defaults::THEME_URL.to_string(),
            plugin_list: PathBuf::from(defaults::PLUGIN_LIST),
            working_dir: PathBuf::from(defaults::WORKING_DIR),
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            layout: LayoutConfig::default(),
            metadata: MetadataConfig::default(),
            http: HttpConfig::default(),
            schedule: ScheduleConfig::default(),
            keep_local_packages: false,
            operators: Vec::new(),
            logging: LoggingSettings::default(),
        }
    }
}

impl BuildConfig {
    /// File name of the full platform bundle.
    #[must_use]
    pub fn full_bundle_name(&self) -> String {
        format!("{}.zip", self.name)
    }

    /// File name of the plugins-only bundle.
    #[must_use]
    pub fn plugins_bundle_name(&self) -> String {
        format!("{}-Plugins.zip", self.name)
    }

    /// Location of the JSON report written after every run.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}-build.json", self.name))
    }

    /// Lock file guarding the working directory; lives beside it so cleanup never removes it.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let stem = self
            .working_dir
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("govpress");
        let parent = self.working_dir.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!("{stem}.lock"))
    }
}

/// Folder layout of the assembled platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Top-level folder produced by the core archive.
    pub core_folder: String,
    /// Content directory inside the core folder.
    pub content_dir: String,
    /// Prefix of the extracted theme snapshot folder.
    pub theme_prefix: String,
    /// Canonical theme folder name.
    pub theme_folder: String,
    /// Plugins-subtree entries removed before the plugins bundle is written.
    pub prune: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            core_folder: defaults::CORE_FOLDER.to_string(),
            content_dir: defaults::CONTENT_DIR.to_string(),
            theme_prefix: defaults::THEME_PREFIX.to_string(),
            theme_folder: defaults::THEME_FOLDER.to_string(),
            prune: defaults::PRUNE_ENTRIES
                .iter()
                .map(|entry| (*entry).to_string())
                .collect(),
        }
    }
}

impl LayoutConfig {
    /// Core folder relative to the working directory.
    #[must_use]
    pub fn core_root(&self) -> PathBuf {
        PathBuf::from(&self.core_folder)
    }

    /// Plugins subtree relative to the working directory.
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.core_root().join(&self.content_dir).join("plugins")
    }

    /// Themes subtree relative to the working directory.
    #[must_use]
    pub fn themes_dir(&self) -> PathBuf {
        self.core_root().join(&self.content_dir).join("themes")
    }
}

/// Options for the plugin metadata request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Field selection sent with every request; disabled fields shrink the response.
    pub fields: BTreeMap<String, bool>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            fields: defaults::METADATA_FIELDS
                .iter()
                .map(|(field, enabled)| ((*field).to_string(), *enabled))
                .collect(),
        }
    }
}

impl MetadataConfig {
    /// Name of the field carrying the download link.
    pub const DOWNLOAD_LINK_FIELD: &'static str = defaults::DOWNLOAD_LINK_FIELD;
}

/// HTTP client options shared by metadata lookups and downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Connection establishment timeout.
    pub connect_timeout_secs: u64,
    /// Whole-request ceiling; unset means downloads may run as long as needed.
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("govpress-build/{}", env!("CARGO_PKG_VERSION")),
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            timeout_secs: None,
        }
    }
}

impl HttpConfig {
    /// Connection timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a duration, if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Recurring build schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Seconds between scheduled runs.
    pub interval_secs: u64,
    /// Fire one run immediately when the schedule is registered.
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::SCHEDULE_INTERVAL_SECS,
            run_on_start: false,
        }
    }
}

impl ScheduleConfig {
    /// Interval as a duration.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Output format requested for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatSetting {
    /// Parse the lowercase representation used in files and environment variables.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Log level used when `RUST_LOG` is not set.
    pub level: String,
    /// Output format; inferred from the build profile when unset.
    pub format: Option<LogFormatSetting>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}
