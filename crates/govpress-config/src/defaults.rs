//! Stock upstream locations and layout names.
//!
//! # Design
//! - Centralise defaults so the model, loader, and tests agree on them.
//! - Keep every remote location overridable through the file or environment.

/// Bundle name used for `<Name>.zip` and `<Name>-Plugins.zip`.
pub(crate) const BUNDLE_NAME: &str = "GovPress";
/// Plugin information endpoint of the WordPress.org API.
pub(crate) const PLUGIN_API: &str = "https://api.wordpress.org/plugins/info/1.2/";
/// Latest stable WordPress release.
pub(crate) const CORE_URL: &str = "https://wordpress.org/latest.zip";
/// Snapshot archive of the GovFresh theme.
pub(crate) const THEME_URL: &str = "https://github.com/govfresh/GovFresh-WP/zipball/master";
/// Curated plugin list, one slug per line.
pub(crate) const PLUGIN_LIST: &str = "plugins.txt";
/// Scratch directory wiped before and after every run.
pub(crate) const WORKING_DIR: &str = ".govpress/upgrade";
/// Public directory receiving the finished bundles.
pub(crate) const OUTPUT_DIR: &str = ".govpress/uploads";
/// Top-level folder of the core archive.
pub(crate) const CORE_FOLDER: &str = "wordpress";
/// Content directory inside the core folder.
pub(crate) const CONTENT_DIR: &str = "wp-content";
/// Prefix of the extracted theme snapshot folder.
pub(crate) const THEME_PREFIX: &str = "govfresh";
/// Canonical theme folder name.
pub(crate) const THEME_FOLDER: &str = "govfresh";
/// Entries shipped with core that are not part of the curated plugin set.
pub(crate) const PRUNE_ENTRIES: &[&str] = &["akismet", "index.php", "hello.php"];
/// Metadata fields requested from the plugin API; only the download link is enabled.
pub(crate) const METADATA_FIELDS: &[(&str, bool)] = &[
    ("description", false),
    ("sections", false),
    ("tested", false),
    ("requires", false),
    ("rating", false),
    ("downloaded", false),
    ("downloadlink", true),
    ("last_updated", false),
    ("homepage", false),
    ("tags", false),
];
/// Field that must stay enabled for plugin resolution to work.
pub(crate) const DOWNLOAD_LINK_FIELD: &str = "downloadlink";
/// Connection timeout for remote calls.
pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Daily schedule.
pub(crate) const SCHEDULE_INTERVAL_SECS: u64 = 86_400;
/// Default log level.
pub(crate) const LOG_LEVEL: &str = "info";
