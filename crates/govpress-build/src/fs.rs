//! Filesystem capability injected into the layout assembler and pipeline driver.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{BuildError, BuildResult};

/// Name and type of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    /// File name of the entry.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Filesystem operations used by the build stages.
pub trait Filesystem: Send + Sync {
    /// Entries directly under `dir`, sorted by name; empty when `dir` is missing.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing directory cannot be read.
    fn list(&self, dir: &Path) -> BuildResult<Vec<DirEntryInfo>>;

    /// Remove a file or directory tree; `Ok(false)` when nothing was there.
    ///
    /// # Errors
    ///
    /// Returns an error when removal fails.
    fn delete(&self, path: &Path) -> BuildResult<bool>;

    /// Move a file or tree, replacing `to` when `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when `to` exists without `overwrite`, or the move fails.
    fn move_path(&self, from: &Path, to: &Path, overwrite: bool) -> BuildResult<()>;

    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create `path` and its parents.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> BuildResult<()>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn list(&self, dir: &Path) -> BuildResult<Vec<DirEntryInfo>> {
        let read = match fs::read_dir(dir) {
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(BuildError::io("list.read_dir", dir, err)),
        };

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|err| BuildError::io("list.entry", dir, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| BuildError::io("list.file_type", entry.path(), err))?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }

    fn delete(&self, path: &Path) -> BuildResult<bool> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(BuildError::io("delete.metadata", path, err)),
        };
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|err| BuildError::io("delete.remove", path, err))?;
        Ok(true)
    }

    fn move_path(&self, from: &Path, to: &Path, overwrite: bool) -> BuildResult<()> {
        if fs::symlink_metadata(to).is_ok() {
            if !overwrite {
                return Err(BuildError::io(
                    "move.destination_exists",
                    to,
                    io::Error::from(io::ErrorKind::AlreadyExists),
                ));
            }
            self.delete(to)?;
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| BuildError::io("move.create_parent", parent, err))?;
        }
        move_tree(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> BuildResult<()> {
        fs::create_dir_all(path).map_err(|err| BuildError::io("create_dir_all", path, err))
    }
}

fn move_tree(source: &Path, destination: &Path) -> BuildResult<()> {
    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    copy_tree(source, destination)?;
    let cleanup = if source.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    match cleanup {
        Err(err) if err.kind() != io::ErrorKind::NotFound => {
            Err(BuildError::io("move.cleanup", source, err))
        }
        _ => Ok(()),
    }
}

fn copy_tree(source: &Path, destination: &Path) -> BuildResult<()> {
    if source.is_file() {
        fs::copy(source, destination)
            .map_err(|err| BuildError::io("copy_tree.copy_file", destination, err))?;
        return Ok(());
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| BuildError::walkdir("copy_tree.walk", source, err))?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            BuildError::io(
                "copy_tree.strip_prefix",
                entry.path(),
                io::Error::from(io::ErrorKind::InvalidInput),
            )
        })?;
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|err| BuildError::io("copy_tree.create_dir", &target, err))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|err| BuildError::io("copy_tree.copy_entry", &target, err))?;
        }
    }
    Ok(())
}
