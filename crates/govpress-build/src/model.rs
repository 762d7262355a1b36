//! Data carried through a build run and persisted in the build report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BuildError;

/// Destination subtree classification of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Platform core, extracted at the working root.
    Core,
    /// Curated plugin, extracted into the plugins subtree.
    Plugin,
    /// Theme, extracted into the themes subtree.
    Theme,
}

impl AssetKind {
    /// Stable label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }

    /// Whether a failure of this asset aborts the run.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self, Self::Core | Self::Theme)
    }
}

/// Logical asset identifier read at pipeline start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetId {
    /// Core or theme with a configured location.
    Fixed {
        /// Asset classification.
        kind: AssetKind,
        /// URL or local path.
        location: String,
    },
    /// Plugin resolved through the metadata service.
    Plugin {
        /// Plugin slug.
        slug: String,
    },
}

impl AssetId {
    /// Core asset at `location`.
    #[must_use]
    pub fn core(location: impl Into<String>) -> Self {
        Self::Fixed {
            kind: AssetKind::Core,
            location: location.into(),
        }
    }

    /// Theme asset at `location`.
    #[must_use]
    pub fn theme(location: impl Into<String>) -> Self {
        Self::Fixed {
            kind: AssetKind::Theme,
            location: location.into(),
        }
    }

    /// Plugin asset identified by `slug`.
    #[must_use]
    pub fn plugin(slug: impl Into<String>) -> Self {
        Self::Plugin { slug: slug.into() }
    }

    /// Asset classification.
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        match self {
            Self::Fixed { kind, .. } => *kind,
            Self::Plugin { .. } => AssetKind::Plugin,
        }
    }

    /// Label used in logs and reports: the slug for plugins, the kind otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Fixed { kind, .. } => kind.as_str(),
            Self::Plugin { slug } => slug,
        }
    }
}

/// Resolved download location, consumed once by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    /// URL or local path.
    pub url: String,
    /// Destination classification.
    pub kind: AssetKind,
}

/// Which of the two bundles an artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleKind {
    /// Complete platform tree.
    Full,
    /// Plugins subtree only.
    Plugins,
}

/// Pipeline driver states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Not running, or finished successfully.
    Idle,
    /// Clearing the working directory.
    Cleaning,
    /// Assembling the core.
    AssemblingCore,
    /// Assembling curated plugins.
    AssemblingPlugins,
    /// Assembling the theme.
    AssemblingTheme,
    /// Writing the full bundle.
    ArchivingFull,
    /// Removing non-curated plugin entries.
    PruningPlugins,
    /// Writing the plugins bundle.
    ArchivingPlugins,
    /// Moving bundles to the output directory.
    Relocating,
    /// A stage failed.
    Failed,
}

impl PipelineState {
    /// Stable state label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cleaning => "cleaning",
            Self::AssemblingCore => "assembling_core",
            Self::AssemblingPlugins => "assembling_plugins",
            Self::AssemblingTheme => "assembling_theme",
            Self::ArchivingFull => "archiving_full",
            Self::PruningPlugins => "pruning_plugins",
            Self::ArchivingPlugins => "archiving_plugins",
            Self::Relocating => "relocating",
            Self::Failed => "failed",
        }
    }
}

/// Discrete pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Initial working-directory wipe.
    CleanStart,
    /// Core download and extraction.
    AssembleCore,
    /// Plugin downloads and extraction.
    AssemblePlugins,
    /// Theme download, extraction and rename.
    AssembleTheme,
    /// Full bundle write.
    ArchiveFull,
    /// Plugins subtree pruning.
    PrunePlugins,
    /// Plugins bundle write.
    ArchivePlugins,
    /// Move to the output directory.
    Relocate,
    /// Final working-directory wipe.
    CleanFinish,
}

impl StepKind {
    /// Stable step name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CleanStart => "clean_start",
            Self::AssembleCore => "assemble_core",
            Self::AssemblePlugins => "assemble_plugins",
            Self::AssembleTheme => "assemble_theme",
            Self::ArchiveFull => "archive_full",
            Self::PrunePlugins => "prune_plugins",
            Self::ArchivePlugins => "archive_plugins",
            Self::Relocate => "relocate",
            Self::CleanFinish => "clean_finish",
        }
    }

    /// Driver state while the step runs.
    #[must_use]
    pub const fn state(self) -> PipelineState {
        match self {
            Self::CleanStart | Self::CleanFinish => PipelineState::Cleaning,
            Self::AssembleCore => PipelineState::AssemblingCore,
            Self::AssemblePlugins => PipelineState::AssemblingPlugins,
            Self::AssembleTheme => PipelineState::AssemblingTheme,
            Self::ArchiveFull => PipelineState::ArchivingFull,
            Self::PrunePlugins => PipelineState::PruningPlugins,
            Self::ArchivePlugins => PipelineState::ArchivingPlugins,
            Self::Relocate => PipelineState::Relocating,
        }
    }
}

/// Status of a step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step began.
    Started,
    /// Step finished.
    Completed,
    /// Step failed.
    Failed,
    /// Step had nothing to do.
    Skipped,
}

impl StepStatus {
    /// Stable status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Last known status of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// Optional detail for display.
    pub detail: Option<String>,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

/// Serializable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty package location.
    NoPackage,
    /// Download transport or status failure.
    DownloadFailed,
    /// Metadata lookup failed.
    MetadataUnavailable,
    /// Metadata carried no download link.
    NoDownloadLink,
    /// Several theme folders matched.
    AmbiguousThemeFolder,
    /// Bundle write failed.
    ArchiveWriteFailed,
    /// Package extraction failed.
    UnpackFailed,
    /// Package held an unsafe entry.
    InvalidArchiveEntry,
    /// Expected folder absent after extraction.
    LayoutMissing,
    /// Local filesystem failure.
    Io,
    /// Curated list unreadable.
    PluginList,
    /// Run lock held elsewhere.
    RunInProgress,
    /// Trigger not permitted.
    Unauthorized,
    /// Every curated plugin failed.
    NoPluginsAssembled,
    /// Scheduler rejected a job.
    Scheduler,
    /// Report persistence failed.
    Report,
    /// HTTP client construction failed.
    HttpClient,
}

impl FailureKind {
    /// Stable label matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPackage => "no_package",
            Self::DownloadFailed => "download_failed",
            Self::MetadataUnavailable => "metadata_unavailable",
            Self::NoDownloadLink => "no_download_link",
            Self::AmbiguousThemeFolder => "ambiguous_theme_folder",
            Self::ArchiveWriteFailed => "archive_write_failed",
            Self::UnpackFailed => "unpack_failed",
            Self::InvalidArchiveEntry => "invalid_archive_entry",
            Self::LayoutMissing => "layout_missing",
            Self::Io => "io",
            Self::PluginList => "plugin_list",
            Self::RunInProgress => "run_in_progress",
            Self::Unauthorized => "unauthorized",
            Self::NoPluginsAssembled => "no_plugins_assembled",
            Self::Scheduler => "scheduler",
            Self::Report => "report",
            Self::HttpClient => "http_client",
        }
    }
}

/// Outcome of one assembled asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOutcome {
    /// Asset label.
    pub asset: String,
    /// Asset classification.
    pub kind: AssetKind,
    /// Resolved location.
    pub url: String,
    /// Top-level names the archive extracted.
    pub folders: Vec<String>,
    /// Number of files written.
    pub files: usize,
}

/// Failure of one asset, or of the run itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFailure {
    /// Asset label.
    pub asset: String,
    /// Asset classification.
    pub kind: AssetKind,
    /// Failure classification.
    pub failure: FailureKind,
    /// Error chain.
    pub message: String,
}

impl AssetFailure {
    /// Record `error` against `asset`.
    #[must_use]
    pub fn new(asset: &AssetId, error: &BuildError) -> Self {
        Self {
            asset: asset.label().to_string(),
            kind: asset.kind(),
            failure: error.kind(),
            message: error.describe(),
        }
    }
}

/// One relocated bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleArtifact {
    /// Which bundle.
    pub kind: BundleKind,
    /// Final path in the output directory.
    pub path: PathBuf,
    /// Number of file entries.
    pub entries: usize,
    /// Archive size in bytes.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the archive.
    pub sha256: String,
}

/// Run-level error summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Failure classification.
    pub kind: FailureKind,
    /// Error chain.
    pub message: String,
}

impl From<&BuildError> for RunError {
    fn from(error: &BuildError) -> Self {
        Self {
            kind: error.kind(),
            message: error.describe(),
        }
    }
}

/// Structured result of one run, persisted after every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Trigger label (`scheduled` or `manual:<principal>`).
    pub trigger: String,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time, once finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether both bundles were produced.
    pub success: bool,
    /// Final driver state.
    pub state: PipelineState,
    /// Step history.
    pub steps: Vec<StepRecord>,
    /// Assembled assets.
    pub assets: Vec<AssetOutcome>,
    /// Per-asset failures.
    pub failures: Vec<AssetFailure>,
    /// Relocated bundles.
    pub artifacts: Vec<BundleArtifact>,
    /// Error that aborted the run.
    pub error: Option<RunError>,
}

impl BuildReport {
    /// Fresh report for a run that is about to start.
    #[must_use]
    pub fn new(run_id: Uuid, trigger: impl Into<String>) -> Self {
        Self {
            run_id,
            trigger: trigger.into(),
            started_at: Utc::now(),
            finished_at: None,
            success: false,
            state: PipelineState::Idle,
            steps: Vec::new(),
            assets: Vec::new(),
            failures: Vec::new(),
            artifacts: Vec::new(),
            error: None,
        }
    }

    /// Record a step status; returns `true` when anything changed.
    pub fn update_step(&mut self, step: StepKind, status: StepStatus, detail: Option<String>) -> bool {
        let now = Utc::now();
        if let Some(record) = self
            .steps
            .iter_mut()
            .find(|record| record.name == step.as_str())
        {
            if record.status == status && record.detail == detail {
                return false;
            }
            record.status = status;
            record.detail = detail;
            record.updated_at = now;
        } else {
            self.steps.push(StepRecord {
                name: step.as_str().to_string(),
                status,
                detail,
                updated_at: now,
            });
        }
        true
    }

    /// Status of `step`, if it has run.
    #[must_use]
    pub fn step_status(&self, step: StepKind) -> Option<StepStatus> {
        self.steps
            .iter()
            .find(|record| record.name == step.as_str())
            .map(|record| record.status)
    }

    /// Artifact of the given kind, if it was produced.
    #[must_use]
    pub fn artifact(&self, kind: BundleKind) -> Option<&BundleArtifact> {
        self.artifacts.iter().find(|artifact| artifact.kind == kind)
    }

    /// Close the report with the run result.
    pub fn finish(&mut self, result: Result<(), &BuildError>) {
        self.finished_at = Some(Utc::now());
        match result {
            Ok(()) => {
                self.success = true;
                self.state = PipelineState::Idle;
                self.error = None;
            }
            Err(error) => {
                self.success = false;
                self.state = PipelineState::Failed;
                self.error = Some(RunError::from(error));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_kinds_are_core_and_theme() {
        assert!(AssetKind::Core.is_required());
        assert!(AssetKind::Theme.is_required());
        assert!(!AssetKind::Plugin.is_required());
    }

    #[test]
    fn asset_labels_prefer_slugs() {
        assert_eq!(AssetId::plugin("demo-plugin").label(), "demo-plugin");
        assert_eq!(AssetId::core("https://example.org/core.zip").label(), "core");
        assert_eq!(AssetId::theme("theme.zip").kind(), AssetKind::Theme);
    }

    #[test]
    fn update_step_replaces_existing_record() {
        let mut report = BuildReport::new(Uuid::new_v4(), "scheduled");
        assert!(report.update_step(StepKind::ArchiveFull, StepStatus::Started, None));
        assert!(!report.update_step(StepKind::ArchiveFull, StepStatus::Started, None));
        assert!(report.update_step(
            StepKind::ArchiveFull,
            StepStatus::Completed,
            Some("12 entries".to_string())
        ));
        assert_eq!(report.steps.len(), 1);
        assert_eq!(
            report.step_status(StepKind::ArchiveFull),
            Some(StepStatus::Completed)
        );
    }

    #[test]
    fn finish_records_failure_state() {
        let mut report = BuildReport::new(Uuid::new_v4(), "manual:root");
        report.finish(Err(&BuildError::NoPluginsAssembled { attempted: 2 }));
        assert!(!report.success);
        assert_eq!(report.state, PipelineState::Failed);
        let error = report.error.as_ref().map(|error| error.kind);
        assert_eq!(error, Some(FailureKind::NoPluginsAssembled));
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn report_serializes_snake_case_kinds() -> anyhow::Result<()> {
        let mut report = BuildReport::new(Uuid::nil(), "scheduled");
        report.failures.push(AssetFailure::new(
            &AssetId::plugin("ghost"),
            &BuildError::NoDownloadLink {
                slug: "ghost".to_string(),
                reason: None,
            },
        ));
        let json = serde_json::to_value(&report)?;
        assert_eq!(json["failures"][0]["failure"], "no_download_link");
        assert_eq!(json["failures"][0]["kind"], "plugin");
        assert_eq!(json["state"], "idle");
        Ok(())
    }

    #[test]
    fn labels_match_serialized_names() -> anyhow::Result<()> {
        for kind in [
            FailureKind::NoDownloadLink,
            FailureKind::AmbiguousThemeFolder,
            FailureKind::Io,
            FailureKind::HttpClient,
        ] {
            assert_eq!(serde_json::to_value(kind)?, kind.as_str());
        }
        for state in [PipelineState::Idle, PipelineState::PruningPlugins] {
            assert_eq!(serde_json::to_value(state)?, state.as_str());
        }
        Ok(())
    }
}
