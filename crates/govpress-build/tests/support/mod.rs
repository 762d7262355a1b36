#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use govpress_build::{
    BuildError, BuildResult, BuildService, Fetcher, LocalFilesystem, MetadataSource,
    build_client,
};
use govpress_config::{BuildConfig, HttpConfig};
use govpress_test_support::wordpress::PackageSet;

/// Metadata source answering from a fixed slug table.
pub struct StaticMetadata {
    links: HashMap<String, String>,
}

impl StaticMetadata {
    pub fn new<I, S, P>(links: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: AsRef<Path>,
    {
        Self {
            links: links
                .into_iter()
                .map(|(slug, path)| (slug.into(), path.as_ref().to_string_lossy().into_owned()))
                .collect(),
        }
    }

    pub fn from_packages(set: &PackageSet) -> Self {
        Self::new(set.plugins.iter().map(|(slug, path)| (slug.clone(), path)))
    }
}

impl MetadataSource for StaticMetadata {
    fn download_link(&self, slug: &str) -> BuildResult<String> {
        self.links
            .get(slug)
            .cloned()
            .ok_or_else(|| BuildError::NoDownloadLink {
                slug: slug.to_string(),
                reason: Some("Plugin not found.".to_string()),
            })
    }
}

/// Configuration rooted in `root` with the core and theme taken from `set`.
pub fn offline_config(root: &Path, set: &PackageSet) -> BuildConfig {
    BuildConfig {
        core_url: set.core.to_string_lossy().into_owned(),
        theme_url: set.theme.to_string_lossy().into_owned(),
        plugin_list: root.join("plugins.txt"),
        working_dir: root.join("state/upgrade"),
        output_dir: root.join("state/uploads"),
        keep_local_packages: true,
        ..BuildConfig::default()
    }
}

pub fn write_plugin_list(config: &BuildConfig, slugs: &[&str]) -> Result<()> {
    fs::write(&config.plugin_list, slugs.join("\n"))?;
    Ok(())
}

pub fn service(
    config: BuildConfig,
    metadata: impl MetadataSource + 'static,
    downloads: PathBuf,
) -> Result<BuildService> {
    let fetcher = Fetcher::new(build_client(&HttpConfig::default())?).with_temp_dir(downloads);
    Ok(BuildService::with_parts(
        config,
        Arc::new(LocalFilesystem),
        Arc::new(metadata),
        fetcher,
    ))
}

pub fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
