//! Bundle archive writer.
//!
//! # Design
//! - Entries are regular files only, walked in file-name order, so unchanged trees give
//!   identical entry lists and contents.
//! - Entry names use forward slashes and never carry a leading slash.
//! - The destination is truncated, so reruns overwrite the previous bundle.

use std::fs::{self, File};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{BuildError, BuildResult};

/// Written archive details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Archive path.
    pub path: PathBuf,
    /// Number of file entries.
    pub entries: usize,
    /// Archive size in bytes.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the archive.
    pub sha256: String,
}

/// Archive every file under `source` with entry names relative to `source`.
///
/// # Errors
///
/// Returns [`BuildError::ArchiveWriteFailed`] when the archive cannot be written and
/// [`BuildError::Walkdir`] when the source cannot be traversed.
pub fn archive_dir(source: &Path, destination: &Path) -> BuildResult<ArchiveSummary> {
    write_archive(source, destination, None)
}

/// Archive every file under `source` with entry names rooted at the source folder's name.
///
/// # Errors
///
/// As [`archive_dir`]; also fails when `source` has no final path segment.
pub fn archive_dir_nested(source: &Path, destination: &Path) -> BuildResult<ArchiveSummary> {
    let root = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BuildError::io(
                "archive.root_name",
                source,
                io::Error::from(io::ErrorKind::InvalidInput),
            )
        })?;
    write_archive(source, destination, Some(&root))
}

fn write_archive(
    source: &Path,
    destination: &Path,
    root: Option<&str>,
) -> BuildResult<ArchiveSummary> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| BuildError::io("archive.create_parent", parent, err))?;
    }
    let file = File::create(destination)
        .map_err(|err| BuildError::archive("archive.create", destination, err.into()))?;
    let mut writer = ZipWriter::new(file);

    let mut entries = 0_usize;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|err| BuildError::walkdir("archive.walk", source, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry_name(source, entry.path(), root)?;
        let options = file_options(entry.path())?;

        writer
            .start_file(name, options)
            .map_err(|err| BuildError::archive("archive.start_file", destination, err))?;
        let mut input = File::open(entry.path())
            .map_err(|err| BuildError::io("archive.open_entry", entry.path(), err))?;
        io::copy(&mut input, &mut writer)
            .map_err(|err| BuildError::archive("archive.write_entry", destination, err.into()))?;
        entries += 1;
    }

    writer
        .finish()
        .map_err(|err| BuildError::archive("archive.finish", destination, err))?;

    let bytes = fs::metadata(destination)
        .map_err(|err| BuildError::io("archive.metadata", destination, err))?
        .len();
    let sha256 = sha256_hex(destination)?;
    debug!(
        path = %destination.display(),
        entries,
        bytes,
        "archive written"
    );
    Ok(ArchiveSummary {
        path: destination.to_path_buf(),
        entries,
        bytes,
        sha256,
    })
}

fn entry_name(source: &Path, path: &Path, root: Option<&str>) -> BuildResult<String> {
    let relative = path.strip_prefix(source).map_err(|_| {
        BuildError::io(
            "archive.strip_prefix",
            path,
            io::Error::from(io::ErrorKind::InvalidInput),
        )
    })?;
    let mut segments: Vec<String> = root.map(str::to_string).into_iter().collect();
    segments.extend(relative.components().filter_map(|component| match component {
        Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
        _ => None,
    }));
    Ok(segments.join("/"))
}

fn file_options(path: &Path) -> BuildResult<FileOptions> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    #[cfg(unix)]
    let options = {
        let mode = fs::metadata(path)
            .map_err(|err| BuildError::io("archive.entry_metadata", path, err))?
            .permissions()
            .mode();
        options.unix_permissions(mode)
    };
    #[cfg(not(unix))]
    let _ = path;
    Ok(options)
}

/// Lowercase hex SHA-256 of the file at `path`.
///
/// # Errors
///
/// Returns [`BuildError::Io`] when the file cannot be read.
pub fn sha256_hex(path: &Path) -> BuildResult<String> {
    let bytes = fs::read(path).map_err(|err| BuildError::io("sha256.read", path, err))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use govpress_test_support::fixtures::read_zip_entries;

    fn sample_tree(root: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(root.join("wp-content/plugins/demo-plugin"))?;
        fs::create_dir_all(root.join("empty-dir"))?;
        fs::write(root.join("index.php"), b"<?php // core")?;
        fs::write(root.join("wp-content/plugins/demo-plugin/demo.php"), b"demo")?;
        Ok(())
    }

    #[test]
    fn entries_are_relative_with_forward_slashes() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("wordpress");
        sample_tree(&source)?;
        let destination = temp.path().join("out/bundle.zip");

        let summary = archive_dir(&source, &destination)?;
        let entries = read_zip_entries(&destination)?;
        let names: Vec<_> = entries.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["index.php", "wp-content/plugins/demo-plugin/demo.php"]);
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.sha256.len(), 64);
        Ok(())
    }

    #[test]
    fn nested_variant_prefixes_the_source_name() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("wordpress");
        sample_tree(&source)?;
        let destination = temp.path().join("GovPress.zip");

        archive_dir_nested(&source, &destination)?;
        let entries = read_zip_entries(&destination)?;
        assert!(entries.keys().all(|name| name.starts_with("wordpress/")));
        assert_eq!(
            entries.get("wordpress/index.php").map(Vec::as_slice),
            Some(b"<?php // core".as_slice())
        );
        Ok(())
    }

    #[test]
    fn rewriting_truncates_previous_archive() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("plugins");
        fs::create_dir_all(&source)?;
        fs::write(source.join("a.txt"), b"a")?;
        let destination = temp.path().join("bundle.zip");
        fs::write(&destination, vec![0_u8; 4096])?;

        let summary = archive_dir(&source, &destination)?;
        assert_eq!(summary.entries, 1);
        assert_eq!(read_zip_entries(&destination)?.len(), 1);
        Ok(())
    }

    #[test]
    fn archiving_twice_gives_identical_entries() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("upgrade");
        sample_tree(&source)?;
        let first = temp.path().join("first.zip");
        let second = temp.path().join("second.zip");

        let first_summary = archive_dir(&source, &first)?;
        let second_summary = archive_dir(&source, &second)?;
        assert_eq!(first_summary.entries, second_summary.entries);
        assert_eq!(read_zip_entries(&first)?, read_zip_entries(&second)?);
        Ok(())
    }

    #[test]
    fn missing_source_fails() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let result = archive_dir(&temp.path().join("absent"), &temp.path().join("out.zip"));
        assert!(matches!(result, Err(BuildError::Walkdir { .. })));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn records_unix_modes() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("bin");
        fs::create_dir_all(&source)?;
        let script = source.join("wp-cli.sh");
        fs::write(&script, b"#!/bin/sh")?;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;
        let destination = temp.path().join("bin.zip");
        archive_dir(&source, &destination)?;

        let mut archive = zip::ZipArchive::new(File::open(&destination)?)?;
        let entry = archive.by_name("wp-cli.sh")?;
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        Ok(())
    }
}
