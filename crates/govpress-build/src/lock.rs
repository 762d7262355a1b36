//! Exclusive run lock held beside the working directory.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{BuildError, BuildResult};

/// Exclusive advisory lock held for the duration of one run.
///
/// Released when dropped. The lock file stays on disk and records the holder's pid.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock at `path` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::RunInProgress`] when another holder has the lock.
    pub fn acquire(path: &Path) -> BuildResult<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| BuildError::io("lock.create_parent", parent, err))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|err| BuildError::io("lock.open", path, err))?;

        if file.try_lock_exclusive().is_err() {
            return Err(BuildError::RunInProgress {
                lock: path.to_path_buf(),
            });
        }

        file.set_len(0)
            .map_err(|err| BuildError::io("lock.truncate", path, err))?;
        write!(file, "{}", std::process::id())
            .map_err(|err| BuildError::io("lock.write_pid", path, err))?;
        debug!(lock = %path.display(), "run lock acquired");
        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_first_is_dropped() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("upgrade.lock");

        let first = RunLock::acquire(&path)?;
        assert_eq!(first.path(), path.as_path());
        assert!(matches!(
            RunLock::acquire(&path),
            Err(BuildError::RunInProgress { .. })
        ));

        drop(first);
        let second = RunLock::acquire(&path)?;
        assert_eq!(fs::read_to_string(second.path())?, std::process::id().to_string());
        Ok(())
    }

    #[test]
    fn stale_lock_file_is_reused_and_rewritten() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("state/upgrade.lock");
        fs::create_dir_all(temp.path().join("state"))?;
        fs::write(&path, "999999999 left by a crashed run")?;

        let lock = RunLock::acquire(&path)?;
        assert_eq!(lock.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path)?, std::process::id().to_string());
        Ok(())
    }
}
