//! Fetcher: local files pass through, everything else is downloaded to a temporary file.

use std::path::{Path, PathBuf};

use reqwest::blocking::{Client, Response};
use tracing::{debug, info};

use crate::error::{BuildError, BuildResult};

const REMOTE_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// Whether `location` names a network resource.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    let lowered = location.trim_start().to_ascii_lowercase();
    REMOTE_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
}

/// Where a fetched package came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOrigin {
    /// Caller-supplied local file; never deleted by the build.
    Local,
    /// Temporary download owned by the build.
    Downloaded,
}

/// Local archive ready for unpacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPackage {
    /// Archive path.
    pub path: PathBuf,
    /// Origin of the archive.
    pub origin: PackageOrigin,
}

/// Retrieves packages over HTTP with the shared blocking client.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    temp_dir: PathBuf,
}

impl Fetcher {
    /// Fetcher writing downloads to the system temporary directory.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Write downloads to `dir` instead.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Fetch `location` to a local file.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NoPackage`] for an empty location and
    /// [`BuildError::DownloadFailed`] on transport errors or non-success statuses.
    pub fn fetch(&self, location: &str) -> BuildResult<FetchedPackage> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(BuildError::NoPackage);
        }

        if !is_remote(trimmed) && Path::new(location).is_file() {
            debug!(path = location, "using local package");
            return Ok(FetchedPackage {
                path: PathBuf::from(location),
                origin: PackageOrigin::Local,
            });
        }

        self.download(trimmed)
    }

    fn download(&self, url: &str) -> BuildResult<FetchedPackage> {
        let failed = |source| BuildError::DownloadFailed {
            url: url.to_string(),
            source,
        };

        info!(url, "downloading package");
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
            .map_err(failed)?;

        std::fs::create_dir_all(&self.temp_dir)
            .map_err(|err| BuildError::io("fetch.create_temp_dir", &self.temp_dir, err))?;
        let mut file = tempfile::Builder::new()
            .prefix("govpress-")
            .suffix(".zip")
            .tempfile_in(&self.temp_dir)
            .map_err(|err| BuildError::io("fetch.create_temp", &self.temp_dir, err))?;
        let bytes = response.copy_to(file.as_file_mut()).map_err(failed)?;

        let path = file
            .into_temp_path()
            .keep()
            .map_err(|err| BuildError::io("fetch.keep_temp", &self.temp_dir, err.error))?;
        debug!(url, path = %path.display(), bytes, "package downloaded");
        Ok(FetchedPackage {
            path,
            origin: PackageOrigin::Downloaded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;

    fn fetcher(temp: &Path) -> Fetcher {
        Fetcher::new(Client::new()).with_temp_dir(temp)
    }

    #[test]
    fn recognises_network_schemes_case_insensitively() {
        assert!(is_remote("https://wordpress.org/latest.zip"));
        assert!(is_remote("HTTP://example.org/a.zip"));
        assert!(is_remote("Ftp://mirror.example.org/a.zip"));
        assert!(!is_remote("/srv/mirror/latest.zip"));
        assert!(!is_remote("file:///srv/mirror/latest.zip"));
    }

    #[test]
    fn local_file_passes_through_unchanged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let archive = temp.path().join("latest.zip");
        fs::write(&archive, b"PK")?;
        let location = archive.to_string_lossy().into_owned();

        let fetched = fetcher(temp.path()).fetch(&location)?;
        assert_eq!(fetched.path, archive);
        assert_eq!(fetched.origin, PackageOrigin::Local);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn local_path_with_surrounding_spaces_is_not_rewritten() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let archive = temp.path().join("latest.zip ");
        fs::write(&archive, b"PK")?;
        let location = archive.to_string_lossy().into_owned();

        let fetched = fetcher(temp.path()).fetch(&location)?;
        assert_eq!(fetched.path.to_string_lossy(), location);
        assert_eq!(fetched.origin, PackageOrigin::Local);
        Ok(())
    }

    #[test]
    fn empty_location_is_no_package() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        assert!(matches!(
            fetcher(temp.path()).fetch(""),
            Err(BuildError::NoPackage)
        ));
        assert!(matches!(
            fetcher(temp.path()).fetch("   "),
            Err(BuildError::NoPackage)
        ));
        Ok(())
    }

    #[test]
    fn downloads_remote_package_to_temp_file() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/latest.zip");
            then.status(200).body("zip-bytes");
        });

        let fetched = fetcher(temp.path()).fetch(&server.url("/latest.zip"))?;
        mock.assert();
        assert_eq!(fetched.origin, PackageOrigin::Downloaded);
        assert!(fetched.path.starts_with(temp.path()));
        assert_eq!(fs::read(&fetched.path)?, b"zip-bytes");
        Ok(())
    }

    #[test]
    fn error_status_is_download_failed() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.zip");
            then.status(404);
        });

        let url = server.url("/missing.zip");
        match fetcher(temp.path()).fetch(&url) {
            Err(BuildError::DownloadFailed { url: failed, .. }) => assert_eq!(failed, url),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn missing_local_path_is_download_failed() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("absent.zip");
        let result = fetcher(temp.path()).fetch(&missing.to_string_lossy());
        assert!(matches!(result, Err(BuildError::DownloadFailed { .. })));
        Ok(())
    }
}
