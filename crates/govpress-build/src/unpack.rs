//! Zip extraction into the working directory.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{BuildError, BuildResult};
use crate::fetcher::{FetchedPackage, PackageOrigin};
use crate::fs::Filesystem;

/// What one extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackSummary {
    /// Directory the archive was extracted into.
    pub destination: PathBuf,
    /// Distinct first path segments of the extracted entries.
    pub top_level: Vec<String>,
    /// Number of files written.
    pub files: usize,
}

/// Extracts packages beneath a working directory.
#[derive(Clone)]
pub struct Unpacker {
    fs: Arc<dyn Filesystem>,
    working_dir: PathBuf,
    keep_local: bool,
}

impl Unpacker {
    /// Unpacker rooted at `working_dir`.
    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            working_dir: working_dir.into(),
            keep_local: false,
        }
    }

    /// Leave local pass-through packages in place after extraction.
    #[must_use]
    pub const fn keep_local_packages(mut self, keep: bool) -> Self {
        self.keep_local = keep;
        self
    }

    /// Extract `package` into `working_dir/subpath` (the root when `None`).
    ///
    /// Later entries overwrite earlier files. The package is deleted afterwards
    /// whether or not extraction succeeded, unless it is a local package and
    /// [`Unpacker::keep_local_packages`] is set.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnpackFailed`] for unreadable archives,
    /// [`BuildError::InvalidArchiveEntry`] for entries escaping the destination,
    /// and [`BuildError::Io`] for write failures.
    pub fn unpack(
        &self,
        package: &FetchedPackage,
        subpath: Option<&Path>,
    ) -> BuildResult<UnpackSummary> {
        let destination = subpath.map_or_else(
            || self.working_dir.clone(),
            |subpath| self.working_dir.join(subpath),
        );
        self.fs.create_dir_all(&destination)?;

        let result = extract_zip(&package.path, &destination);

        let keep = self.keep_local && package.origin == PackageOrigin::Local;
        if !keep && let Err(err) = self.fs.delete(&package.path) {
            warn!(
                path = %package.path.display(),
                error = %err.describe(),
                "failed to remove package"
            );
        }

        let (top_level, files) = result?;
        debug!(
            destination = %destination.display(),
            files,
            "package extracted"
        );
        Ok(UnpackSummary {
            destination,
            top_level: top_level.into_iter().collect(),
            files,
        })
    }
}

fn extract_zip(source: &Path, target: &Path) -> BuildResult<(BTreeSet<String>, usize)> {
    let file = File::open(source).map_err(|err| BuildError::io("extract_zip.open", source, err))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| BuildError::unpack("extract_zip.decode", source, err))?;

    let mut top_level = BTreeSet::new();
    let mut files = 0_usize;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| BuildError::unpack("extract_zip.read_entry", source, err))?;
        let entry_path = sanitize_archive_path(source, entry.name())?;
        if entry_path.as_os_str().is_empty() {
            continue;
        }
        if let Some(Component::Normal(first)) = entry_path.components().next() {
            top_level.insert(first.to_string_lossy().into_owned());
        }
        let destination = target.join(&entry_path);

        if entry.name().ends_with('/') {
            fs::create_dir_all(&destination)
                .map_err(|err| BuildError::io("extract_zip.create_dir", &destination, err))?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| BuildError::io("extract_zip.create_parent", parent, err))?;
        }

        let mut output = File::create(&destination)
            .map_err(|err| BuildError::io("extract_zip.create_file", &destination, err))?;
        io::copy(&mut entry, &mut output)
            .map_err(|err| BuildError::io("extract_zip.copy", &destination, err))?;
        files += 1;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            fs::set_permissions(&destination, fs::Permissions::from_mode(mode))
                .map_err(|err| BuildError::io("extract_zip.set_permissions", &destination, err))?;
        }
    }

    Ok((top_level, files))
}

fn sanitize_archive_path(archive: &Path, entry: &str) -> BuildResult<PathBuf> {
    let rejected = |reason| BuildError::InvalidArchiveEntry {
        path: archive.to_path_buf(),
        entry: entry.to_string(),
        reason,
    };

    let normalized = entry.replace('\\', "/");
    let path = Path::new(&normalized);
    if path.is_absolute() || normalized.starts_with('/') {
        return Err(rejected("absolute_path"));
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            _ => return Err(rejected("invalid_segment")),
        }
    }
    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFilesystem;
    use govpress_test_support::fixtures::write_zip;

    fn unpacker(root: &Path) -> Unpacker {
        Unpacker::new(Arc::new(LocalFilesystem), root).keep_local_packages(true)
    }

    #[test]
    fn sanitize_rejects_escaping_entries() {
        let archive = Path::new("evil.zip");
        assert!(sanitize_archive_path(archive, "../etc/passwd").is_err());
        assert!(sanitize_archive_path(archive, "/etc/passwd").is_err());
        assert!(sanitize_archive_path(archive, "a/../../b").is_err());
        assert!(sanitize_archive_path(archive, "..\\evil.php").is_err());
        assert!(matches!(
            sanitize_archive_path(archive, "./wordpress/index.php"),
            Ok(path) if path == Path::new("wordpress/index.php")
        ));
    }

    #[test]
    fn extracts_into_subpath_and_keeps_local_package() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let package = temp.path().join("demo.zip");
        write_zip(
            &package,
            &[
                ("demo-plugin/", b"".as_slice()),
                ("demo-plugin/demo.php", b"<?php // demo".as_slice()),
                ("demo-plugin/readme.txt", b"readme".as_slice()),
            ],
        )?;
        let work = temp.path().join("work");

        let summary = unpacker(&work).unpack(
            &FetchedPackage {
                path: package.clone(),
                origin: PackageOrigin::Local,
            },
            Some(Path::new("wordpress/wp-content/plugins")),
        )?;

        assert_eq!(summary.top_level, vec!["demo-plugin".to_string()]);
        assert_eq!(summary.files, 2);
        assert_eq!(
            fs::read(work.join("wordpress/wp-content/plugins/demo-plugin/demo.php"))?,
            b"<?php // demo"
        );
        assert!(package.exists());
        Ok(())
    }

    #[test]
    fn local_package_is_removed_by_default() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let package = temp.path().join("latest.zip");
        write_zip(&package, &[("wordpress/index.php", b"<?php".as_slice())])?;
        let work = temp.path().join("work");

        Unpacker::new(Arc::new(LocalFilesystem), &work).unpack(
            &FetchedPackage {
                path: package.clone(),
                origin: PackageOrigin::Local,
            },
            None,
        )?;

        assert!(work.join("wordpress/index.php").is_file());
        assert!(!package.exists());
        Ok(())
    }

    #[test]
    fn keeping_local_packages_still_removes_downloads() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let package = temp.path().join("download.zip");
        write_zip(&package, &[("demo/demo.php", b"<?php".as_slice())])?;

        unpacker(&temp.path().join("work")).unpack(
            &FetchedPackage {
                path: package.clone(),
                origin: PackageOrigin::Downloaded,
            },
            None,
        )?;

        assert!(!package.exists());
        Ok(())
    }

    #[test]
    fn downloaded_package_is_removed_even_on_failure() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let package = temp.path().join("broken.zip");
        fs::write(&package, b"not a zip")?;

        let result = unpacker(&temp.path().join("work")).unpack(
            &FetchedPackage {
                path: package.clone(),
                origin: PackageOrigin::Downloaded,
            },
            None,
        );

        assert!(matches!(result, Err(BuildError::UnpackFailed { .. })));
        assert!(!package.exists());
        Ok(())
    }

    #[test]
    fn later_extraction_overwrites_collisions() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let first = temp.path().join("first.zip");
        let second = temp.path().join("second.zip");
        write_zip(&first, &[("shared/file.txt", b"first".as_slice())])?;
        write_zip(&second, &[("shared/file.txt", b"second".as_slice())])?;
        let work = temp.path().join("work");
        let unpacker = unpacker(&work);

        for path in [first, second] {
            unpacker.unpack(
                &FetchedPackage {
                    path,
                    origin: PackageOrigin::Local,
                },
                None,
            )?;
        }

        assert_eq!(fs::read(work.join("shared/file.txt"))?, b"second");
        Ok(())
    }

    #[test]
    fn rejects_traversal_entry() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let package = temp.path().join("evil.zip");
        write_zip(&package, &[("../outside.txt", b"x".as_slice())])?;
        let work = temp.path().join("work");

        let result = unpacker(&work).unpack(
            &FetchedPackage {
                path: package,
                origin: PackageOrigin::Local,
            },
            None,
        );

        assert!(matches!(result, Err(BuildError::InvalidArchiveEntry { .. })));
        assert!(!temp.path().join("outside.txt").exists());
        Ok(())
    }
}
