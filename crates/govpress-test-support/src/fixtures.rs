//! Zip and temp-directory helpers.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry name and contents; names ending in `/` are written as directories.
pub type ZipEntry<'a> = (&'a str, &'a [u8]);

/// Fresh temporary directory with a recognisable prefix.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("govpress-test-")
        .tempdir()
        .context("failed to create temporary directory")
}

/// Write a zip archive at `path` containing `entries` in order.
///
/// # Errors
///
/// Returns an error when the archive cannot be written.
pub fn write_zip(path: &Path, entries: &[ZipEntry<'_>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_entries(file, entries)?;
    Ok(())
}

/// Zip archive containing `entries`, as bytes.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn zip_bytes(entries: &[ZipEntry<'_>]) -> Result<Vec<u8>> {
    let cursor = write_entries(Cursor::new(Vec::new()), entries)?;
    Ok(cursor.into_inner())
}

fn write_entries<W: Write + Seek>(target: W, entries: &[ZipEntry<'_>]) -> Result<W> {
    let mut writer = ZipWriter::new(target);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, options)
                .with_context(|| format!("failed to add directory {name}"))?;
        } else {
            writer
                .start_file(*name, options)
                .with_context(|| format!("failed to start entry {name}"))?;
            writer
                .write_all(contents)
                .with_context(|| format!("failed to write entry {name}"))?;
        }
    }
    writer.finish().context("failed to finish archive")
}

/// File entries of the archive at `path`, keyed by entry name; directories are omitted.
///
/// # Errors
///
/// Returns an error when the archive cannot be read.
pub fn read_zip_entries(path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let mut entries = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        entries.insert(entry.name().to_string(), contents);
    }
    Ok(entries)
}

/// Entry names of the archive at `path`, in archive order.
///
/// # Errors
///
/// Returns an error when the archive cannot be read.
pub fn zip_entry_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let archive = ZipArchive::new(file)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Distinct first path segments of the archive's entries.
///
/// # Errors
///
/// Returns an error when the archive cannot be read.
pub fn top_level_names(path: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = zip_entry_names(path)?
        .into_iter()
        .filter_map(|name| name.split('/').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_archive_reads_back() -> Result<()> {
        let temp = temp_dir()?;
        let path = temp.path().join("sample.zip");
        write_zip(
            &path,
            &[
                ("plugin/", b"".as_slice()),
                ("plugin/plugin.php", b"<?php".as_slice()),
            ],
        )?;
        let entries = read_zip_entries(&path)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get("plugin/plugin.php").map(Vec::as_slice),
            Some(b"<?php".as_slice())
        );
        assert_eq!(top_level_names(&path)?, vec!["plugin"]);
        Ok(())
    }

    #[test]
    fn zip_bytes_are_a_valid_archive() -> Result<()> {
        let bytes = zip_bytes(&[("a.txt", b"a".as_slice())])?;
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        assert_eq!(archive.len(), 1);
        Ok(())
    }
}
