//! Layout assembly: resolve, fetch and unpack each asset into its subtree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use govpress_config::LayoutConfig;

use crate::error::{BuildError, BuildResult};
use crate::fetcher::Fetcher;
use crate::fs::Filesystem;
use crate::model::{AssetId, AssetKind, DownloadDescriptor};
use crate::resolver::AssetResolver;
use crate::unpack::{UnpackSummary, Unpacker};

/// Result of placing one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledAsset {
    /// Resolved location.
    pub descriptor: DownloadDescriptor,
    /// Extraction details.
    pub summary: UnpackSummary,
}

/// Outcome of the theme folder rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeRename {
    /// The snapshot folder was renamed.
    Renamed {
        /// Original folder name.
        from: String,
        /// Canonical folder name.
        to: String,
    },
    /// The only matching folder already has the canonical name.
    AlreadyCanonical,
    /// No folder matched the prefix.
    NoMatch,
}

/// Places core, plugins and theme under the working directory.
#[derive(Clone)]
pub struct LayoutAssembler {
    fs: Arc<dyn Filesystem>,
    resolver: AssetResolver,
    fetcher: Fetcher,
    unpacker: Unpacker,
    working_dir: PathBuf,
    layout: LayoutConfig,
}

impl LayoutAssembler {
    /// Assembler writing beneath `working_dir`.
    #[must_use]
    pub fn new(
        fs: Arc<dyn Filesystem>,
        resolver: AssetResolver,
        fetcher: Fetcher,
        working_dir: impl Into<PathBuf>,
        layout: LayoutConfig,
    ) -> Self {
        let working_dir = working_dir.into();
        let unpacker = Unpacker::new(Arc::clone(&fs), working_dir.clone());
        Self {
            fs,
            resolver,
            fetcher,
            unpacker,
            working_dir,
            layout,
        }
    }

    /// Leave local pass-through packages in place after extraction.
    #[must_use]
    pub fn keep_local_packages(mut self, keep: bool) -> Self {
        self.unpacker = self.unpacker.keep_local_packages(keep);
        self
    }

    /// Subtree an asset kind extracts into, relative to the working directory.
    #[must_use]
    pub fn destination(&self, kind: AssetKind) -> Option<PathBuf> {
        match kind {
            AssetKind::Core => None,
            AssetKind::Plugin => Some(self.layout.plugins_dir()),
            AssetKind::Theme => Some(self.layout.themes_dir()),
        }
    }

    /// Absolute core folder.
    #[must_use]
    pub fn core_root(&self) -> PathBuf {
        self.working_dir.join(self.layout.core_root())
    }

    /// Absolute plugins subtree.
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.working_dir.join(self.layout.plugins_dir())
    }

    /// Absolute themes subtree.
    #[must_use]
    pub fn themes_dir(&self) -> PathBuf {
        self.working_dir.join(self.layout.themes_dir())
    }

    /// Resolve, fetch and unpack `asset`.
    ///
    /// # Errors
    ///
    /// Propagates resolver, fetcher and unpacker failures; a core archive that does not
    /// produce the core folder fails with [`BuildError::LayoutMissing`].
    pub fn assemble(&self, asset: &AssetId) -> BuildResult<AssembledAsset> {
        let descriptor = self.resolver.resolve(asset)?;
        let package = self.fetcher.fetch(&descriptor.url)?;
        let destination = self.destination(descriptor.kind);
        let summary = self.unpacker.unpack(&package, destination.as_deref())?;

        if descriptor.kind == AssetKind::Core && !self.fs.exists(&self.core_root()) {
            return Err(BuildError::LayoutMissing {
                path: self.core_root(),
            });
        }

        info!(
            asset = asset.label(),
            url = %descriptor.url,
            folders = ?summary.top_level,
            "asset assembled"
        );
        Ok(AssembledAsset {
            descriptor,
            summary,
        })
    }

    /// Rename the extracted theme snapshot folder to the canonical name.
    ///
    /// # Errors
    ///
    /// See [`rename_theme_folder`].
    pub fn rename_theme(&self) -> BuildResult<ThemeRename> {
        rename_theme_folder(
            self.fs.as_ref(),
            &self.themes_dir(),
            &self.layout.theme_prefix,
            &self.layout.theme_folder,
        )
    }
}

/// Rename the single folder in `themes_dir` starting with `prefix` to `canonical`.
///
/// A folder already named `canonical` counts as a match, so it is never overwritten.
///
/// # Errors
///
/// Returns [`BuildError::AmbiguousThemeFolder`] when two or more folders match.
pub fn rename_theme_folder(
    fs: &dyn Filesystem,
    themes_dir: &Path,
    prefix: &str,
    canonical: &str,
) -> BuildResult<ThemeRename> {
    let candidates: Vec<String> = fs
        .list(themes_dir)?
        .into_iter()
        .filter(|entry| entry.is_dir && entry.name.starts_with(prefix))
        .map(|entry| entry.name)
        .collect();

    match candidates.as_slice() {
        [] => {
            warn!(prefix, themes = %themes_dir.display(), "no theme folder matched prefix");
            Ok(ThemeRename::NoMatch)
        }
        [only] if only == canonical => {
            debug!(folder = canonical, "theme folder already canonical");
            Ok(ThemeRename::AlreadyCanonical)
        }
        [only] => {
            fs.move_path(&themes_dir.join(only), &themes_dir.join(canonical), true)?;
            info!(from = %only, to = canonical, "theme folder renamed");
            Ok(ThemeRename::Renamed {
                from: only.clone(),
                to: canonical.to_string(),
            })
        }
        _ => Err(BuildError::AmbiguousThemeFolder {
            prefix: prefix.to_string(),
            candidates,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFilesystem;
    use std::fs;

    #[test]
    fn single_match_is_renamed() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("govfresh-GovFresh-WP-1a2b3c"))?;
        fs::create_dir_all(temp.path().join("twentytwelve"))?;

        let outcome = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh")?;
        assert_eq!(
            outcome,
            ThemeRename::Renamed {
                from: "govfresh-GovFresh-WP-1a2b3c".to_string(),
                to: "govfresh".to_string(),
            }
        );
        assert!(temp.path().join("govfresh").is_dir());
        assert!(temp.path().join("twentytwelve").is_dir());
        Ok(())
    }

    #[test]
    fn zero_matches_leave_tree_unchanged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("twentytwelve"))?;

        let outcome = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh")?;
        assert_eq!(outcome, ThemeRename::NoMatch);
        let names: Vec<_> = LocalFilesystem
            .list(temp.path())?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["twentytwelve"]);
        Ok(())
    }

    #[test]
    fn two_matches_are_ambiguous() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("govfresh-a"))?;
        fs::create_dir_all(temp.path().join("govfresh-b"))?;

        let result = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh");
        match result {
            Err(BuildError::AmbiguousThemeFolder { candidates, .. }) => {
                assert_eq!(candidates, vec!["govfresh-a", "govfresh-b"]);
            }
            other => panic!("expected AmbiguousThemeFolder, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn canonical_folder_beside_a_snapshot_is_ambiguous() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("govfresh"))?;
        fs::write(temp.path().join("govfresh/keep.css"), b"/* keep */")?;
        fs::create_dir_all(temp.path().join("govfresh-GovFresh-WP-1a2b3c"))?;

        let result = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh");
        match result {
            Err(BuildError::AmbiguousThemeFolder { candidates, .. }) => {
                assert_eq!(candidates, vec!["govfresh", "govfresh-GovFresh-WP-1a2b3c"]);
            }
            other => panic!("expected AmbiguousThemeFolder, got {other:?}"),
        }
        assert!(temp.path().join("govfresh/keep.css").is_file());
        assert!(temp.path().join("govfresh-GovFresh-WP-1a2b3c").is_dir());
        Ok(())
    }

    #[test]
    fn lone_canonical_folder_is_left_alone() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("govfresh"))?;
        fs::write(temp.path().join("govfresh/style.css"), b"/* GovFresh */")?;

        let outcome = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh")?;
        assert_eq!(outcome, ThemeRename::AlreadyCanonical);
        assert!(temp.path().join("govfresh/style.css").is_file());
        Ok(())
    }

    #[test]
    fn files_with_the_prefix_are_ignored() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(temp.path().join("govfresh-notes.txt"), b"notes")?;

        let outcome = rename_theme_folder(&LocalFilesystem, temp.path(), "govfresh", "govfresh")?;
        assert_eq!(outcome, ThemeRename::NoMatch);
        Ok(())
    }
}
