//! Miniature core, plugin and theme snapshots shaped like the real downloads.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::fixtures::{ZipEntry, write_zip, zip_bytes};

/// Core snapshot: a `wordpress/` root with the stock plugins the bundle prunes.
pub const CORE_ENTRIES: &[ZipEntry<'static>] = &[
    ("wordpress/", b""),
    ("wordpress/index.php", b"<?php // front controller"),
    ("wordpress/wp-config-sample.php", b"<?php // sample config"),
    ("wordpress/wp-content/", b""),
    ("wordpress/wp-content/index.php", b"<?php // Silence is golden."),
    ("wordpress/wp-content/plugins/", b""),
    ("wordpress/wp-content/plugins/index.php", b"<?php // Silence is golden."),
    ("wordpress/wp-content/plugins/hello.php", b"<?php // Hello Dolly"),
    ("wordpress/wp-content/plugins/akismet/", b""),
    ("wordpress/wp-content/plugins/akismet/akismet.php", b"<?php // Akismet"),
    ("wordpress/wp-content/themes/", b""),
    ("wordpress/wp-content/themes/twentytwelve/style.css", b"/* Twenty Twelve */"),
];

/// Folder name of a source-control theme snapshot.
pub const THEME_SNAPSHOT_FOLDER: &str = "govfresh-GovFresh-WP-5f2c1d9";

/// Entries of a plugin archive rooted at `slug/`.
#[must_use]
pub fn plugin_entries(slug: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        (format!("{slug}/"), Vec::new()),
        (
            format!("{slug}/{slug}.php"),
            format!("<?php /* Plugin Name: {slug} */").into_bytes(),
        ),
        (format!("{slug}/readme.txt"), format!("=== {slug} ===").into_bytes()),
    ]
}

/// Entries of a theme snapshot rooted at `folder/`.
#[must_use]
pub fn theme_entries(folder: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        (format!("{folder}/"), Vec::new()),
        (
            format!("{folder}/style.css"),
            b"/* Theme Name: GovFresh */".to_vec(),
        ),
        (format!("{folder}/functions.php"), b"<?php".to_vec()),
    ]
}

fn borrow_entries(entries: &[(String, Vec<u8>)]) -> Vec<ZipEntry<'_>> {
    entries
        .iter()
        .map(|(name, contents)| (name.as_str(), contents.as_slice()))
        .collect()
}

/// Core archive bytes.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn core_zip() -> Result<Vec<u8>> {
    zip_bytes(CORE_ENTRIES)
}

/// Plugin archive bytes for `slug`.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn plugin_zip(slug: &str) -> Result<Vec<u8>> {
    zip_bytes(&borrow_entries(&plugin_entries(slug)))
}

/// Theme snapshot archive bytes.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn theme_zip() -> Result<Vec<u8>> {
    zip_bytes(&borrow_entries(&theme_entries(THEME_SNAPSHOT_FOLDER)))
}

/// Local package files for an offline build.
#[derive(Debug, Clone)]
pub struct PackageSet {
    /// Core archive path.
    pub core: PathBuf,
    /// Theme archive path.
    pub theme: PathBuf,
    /// Plugin slug and archive path pairs.
    pub plugins: Vec<(String, PathBuf)>,
}

impl PackageSet {
    /// Archive path of `slug`, if one was written.
    #[must_use]
    pub fn plugin(&self, slug: &str) -> Option<&Path> {
        self.plugins
            .iter()
            .find(|(candidate, _)| candidate == slug)
            .map(|(_, path)| path.as_path())
    }
}

/// Write core, theme and one archive per slug under `dir`.
///
/// # Errors
///
/// Returns an error when any archive cannot be written.
pub fn write_package_set(dir: &Path, slugs: &[&str]) -> Result<PackageSet> {
    let core = dir.join("latest.zip");
    write_zip(&core, CORE_ENTRIES)?;

    let theme = dir.join("govfresh-master.zip");
    write_zip(
        &theme,
        &borrow_entries(&theme_entries(THEME_SNAPSHOT_FOLDER)),
    )?;

    let mut plugins = Vec::new();
    for slug in slugs {
        let path = dir.join(format!("{slug}.zip"));
        write_zip(&path, &borrow_entries(&plugin_entries(slug)))?;
        plugins.push(((*slug).to_string(), path));
    }

    Ok(PackageSet {
        core,
        theme,
        plugins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{temp_dir, top_level_names};

    #[test]
    fn package_set_writes_every_archive() -> Result<()> {
        let temp = temp_dir()?;
        let set = write_package_set(temp.path(), &["demo-plugin"])?;
        assert_eq!(top_level_names(&set.core)?, vec!["wordpress"]);
        assert_eq!(top_level_names(&set.theme)?, vec![THEME_SNAPSHOT_FOLDER]);
        let plugin = set.plugin("demo-plugin").map(Path::to_path_buf);
        assert!(plugin.is_some_and(|path| path.is_file()));
        Ok(())
    }
}
