//! # Design
//!
//! - Structured, constant-message errors for every build stage.
//! - Context (operation, path, url, slug) lives in fields so reports and tests can inspect it.
//! - Every variant maps to a serializable [`FailureKind`] recorded in the build report.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zip::result::ZipError;

use crate::model::FailureKind;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Reasons a plugin metadata lookup could not produce a usable response.
#[derive(Debug, Error)]
pub enum MetadataFailure {
    /// The request never completed.
    #[error("metadata request failed")]
    Transport(#[source] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("metadata service returned status {0}")]
    Status(u16),
    /// The body was not the expected JSON object.
    #[error("metadata response unparseable")]
    Parse(#[source] serde_json::Error),
}

/// Errors produced while building bundles.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Fetch was asked for an empty location.
    #[error("no package location supplied")]
    NoPackage,
    /// Transport failure or non-success status while downloading.
    #[error("download failed")]
    DownloadFailed {
        /// Location that was requested.
        url: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// Plugin metadata lookup failed.
    #[error("plugin metadata unavailable")]
    MetadataUnavailable {
        /// Plugin slug that was queried.
        slug: String,
        /// What went wrong with the lookup.
        source: MetadataFailure,
    },
    /// Metadata parsed but carried no download link.
    #[error("plugin metadata has no download link")]
    NoDownloadLink {
        /// Plugin slug that was queried.
        slug: String,
        /// Error message reported by the service, when present.
        reason: Option<String>,
    },
    /// More than one extracted theme folder matched the prefix.
    #[error("theme folder is ambiguous")]
    AmbiguousThemeFolder {
        /// Prefix used for matching.
        prefix: String,
        /// Matching folder names.
        candidates: Vec<String>,
    },
    /// Writing a bundle archive failed.
    #[error("archive write failed")]
    ArchiveWriteFailed {
        /// Operation that failed.
        operation: &'static str,
        /// Archive path.
        path: PathBuf,
        /// Underlying zip error.
        source: ZipError,
    },
    /// Reading a downloaded archive failed.
    #[error("archive unpack failed")]
    UnpackFailed {
        /// Operation that failed.
        operation: &'static str,
        /// Archive path.
        path: PathBuf,
        /// Underlying zip error.
        source: ZipError,
    },
    /// Archive entry would escape the extraction root.
    #[error("archive entry rejected")]
    InvalidArchiveEntry {
        /// Archive path.
        path: PathBuf,
        /// Entry name as stored in the archive.
        entry: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// Expected folder was absent after an asset was unpacked.
    #[error("expected layout folder missing")]
    LayoutMissing {
        /// Folder that should exist.
        path: PathBuf,
    },
    /// IO failure on the local filesystem.
    #[error("build io failure")]
    Io {
        /// Operation that failed.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory traversal failure.
    #[error("build walkdir failure")]
    Walkdir {
        /// Operation that failed.
        operation: &'static str,
        /// Root of the traversal.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Curated plugin list could not be read.
    #[error("plugin list unreadable")]
    PluginList {
        /// List path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Another run holds the run lock.
    #[error("build already in progress")]
    RunInProgress {
        /// Lock file path.
        lock: PathBuf,
    },
    /// Manual trigger from a principal without the build capability.
    #[error("principal may not trigger builds")]
    Unauthorized {
        /// Principal name.
        principal: String,
    },
    /// Core or theme could not be assembled.
    #[error("required asset '{asset}' failed")]
    RequiredAssetFailed {
        /// Asset label.
        asset: String,
        /// Failure of the asset.
        source: Box<BuildError>,
    },
    /// Every curated plugin failed.
    #[error("no curated plugin could be assembled")]
    NoPluginsAssembled {
        /// Number of plugins attempted.
        attempted: usize,
    },
    /// Scheduler registration failure.
    #[error("scheduler rejected job")]
    Scheduler {
        /// Job name.
        job: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// Build report could not be serialized or parsed.
    #[error("build report unreadable")]
    Report {
        /// Operation that failed.
        operation: &'static str,
        /// Report path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// HTTP client could not be constructed.
    #[error("http client unavailable")]
    HttpClient {
        /// Underlying builder error.
        source: reqwest::Error,
    },
}

impl BuildError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: ZipError,
    ) -> Self {
        Self::ArchiveWriteFailed {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unpack(operation: &'static str, path: impl Into<PathBuf>, source: ZipError) -> Self {
        Self::UnpackFailed {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn report(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Report {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Classification recorded in build reports.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoPackage => FailureKind::NoPackage,
            Self::DownloadFailed { .. } => FailureKind::DownloadFailed,
            Self::MetadataUnavailable { .. } => FailureKind::MetadataUnavailable,
            Self::NoDownloadLink { .. } => FailureKind::NoDownloadLink,
            Self::AmbiguousThemeFolder { .. } => FailureKind::AmbiguousThemeFolder,
            Self::ArchiveWriteFailed { .. } => FailureKind::ArchiveWriteFailed,
            Self::UnpackFailed { .. } => FailureKind::UnpackFailed,
            Self::InvalidArchiveEntry { .. } => FailureKind::InvalidArchiveEntry,
            Self::LayoutMissing { .. } => FailureKind::LayoutMissing,
            Self::Io { .. } | Self::Walkdir { .. } => FailureKind::Io,
            Self::PluginList { .. } => FailureKind::PluginList,
            Self::RunInProgress { .. } => FailureKind::RunInProgress,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::RequiredAssetFailed { source, .. } => source.kind(),
            Self::NoPluginsAssembled { .. } => FailureKind::NoPluginsAssembled,
            Self::Scheduler { .. } => FailureKind::Scheduler,
            Self::Report { .. } => FailureKind::Report,
            Self::HttpClient { .. } => FailureKind::HttpClient,
        }
    }

    /// Message followed by every source in the chain, separated by `: `.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut current = self.source();
        while let Some(source) = current {
            message.push_str(": ");
            message.push_str(&source.to_string());
            current = source.source();
        }
        message
    }
}
