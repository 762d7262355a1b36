//! Pipeline driver: one linear pass from an empty working directory to relocated bundles.
//!
//! # Design
//! - Steps run in fixed order; each is recorded in the report as started, then completed,
//!   skipped or failed.
//! - Per-plugin failures are collected; core and theme failures abort, as does a non-empty
//!   plugin list where nothing assembled.
//! - A failed run leaves the working directory as it was; the next run's initial clean is
//!   the only cleanup.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use govpress_config::BuildConfig;

use crate::archive::{ArchiveSummary, archive_dir, archive_dir_nested};
use crate::error::{BuildError, BuildResult};
use crate::fs::Filesystem;
use crate::layout::{AssembledAsset, LayoutAssembler, ThemeRename};
use crate::model::{
    AssetFailure, AssetId, AssetOutcome, BuildReport, BundleArtifact, BundleKind, PipelineState,
    StepKind, StepStatus,
};
use crate::plugins::CuratedList;

enum StepOutcome {
    Completed(Option<String>),
    Skipped(Option<String>),
}

impl StepOutcome {
    const fn status(&self) -> StepStatus {
        match self {
            Self::Completed(_) => StepStatus::Completed,
            Self::Skipped(_) => StepStatus::Skipped,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Self::Completed(detail) | Self::Skipped(detail) => detail.as_deref(),
        }
    }
}

/// Runs the build steps against one working directory.
pub struct PipelineDriver {
    fs: Arc<dyn Filesystem>,
    assembler: LayoutAssembler,
    config: BuildConfig,
}

impl PipelineDriver {
    /// Driver for `config`, placing assets with `assembler`.
    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>, assembler: LayoutAssembler, config: BuildConfig) -> Self {
        Self {
            fs,
            assembler,
            config,
        }
    }

    /// Execute every step, recording progress in `report`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that failed; `report.state` is then
    /// [`PipelineState::Failed`].
    pub fn run(&self, plugins: &CuratedList, report: &mut BuildReport) -> BuildResult<()> {
        let mut curated_folders = BTreeSet::new();
        let mut full_bundle = None;
        let mut plugins_bundle = None;

        Self::execute_step(report, StepKind::CleanStart, |_| self.clean())?;
        Self::execute_step(report, StepKind::AssembleCore, |report| {
            let core = AssetId::core(self.config.core_url.as_str());
            Ok(match self.assemble_asset(report, &core)? {
                Some(assembled) => {
                    StepOutcome::Completed(Some(format!("{} files", assembled.summary.files)))
                }
                None => StepOutcome::Skipped(None),
            })
        })?;
        Self::execute_step(report, StepKind::AssemblePlugins, |report| {
            self.assemble_plugins(report, plugins, &mut curated_folders)
        })?;
        Self::execute_step(report, StepKind::AssembleTheme, |report| {
            self.assemble_theme(report)
        })?;
        Self::execute_step(report, StepKind::ArchiveFull, |_| {
            let destination = self.config.working_dir.join(self.config.full_bundle_name());
            let summary = archive_dir_nested(&self.assembler.core_root(), &destination)?;
            let detail = format!("{} entries", summary.entries);
            full_bundle = Some(summary);
            Ok(StepOutcome::Completed(Some(detail)))
        })?;
        Self::execute_step(report, StepKind::PrunePlugins, |_| {
            self.prune_plugins(&curated_folders)
        })?;
        Self::execute_step(report, StepKind::ArchivePlugins, |_| {
            let destination = self
                .config
                .working_dir
                .join(self.config.plugins_bundle_name());
            let summary = archive_dir(&self.assembler.plugins_dir(), &destination)?;
            let detail = format!("{} entries", summary.entries);
            plugins_bundle = Some(summary);
            Ok(StepOutcome::Completed(Some(detail)))
        })?;
        Self::execute_step(report, StepKind::Relocate, |report| {
            let bundles = [
                (BundleKind::Full, full_bundle.take()),
                (BundleKind::Plugins, plugins_bundle.take()),
            ];
            for (kind, summary) in bundles {
                let summary = summary.ok_or_else(|| BuildError::LayoutMissing {
                    path: self.config.working_dir.clone(),
                })?;
                report.artifacts.push(self.relocate(kind, summary)?);
            }
            Ok(StepOutcome::Completed(Some(
                self.config.output_dir.display().to_string(),
            )))
        })?;
        Self::execute_step(report, StepKind::CleanFinish, |_| self.clean())?;

        report.state = PipelineState::Idle;
        Ok(())
    }

    fn execute_step<F>(report: &mut BuildReport, step: StepKind, op: F) -> BuildResult<()>
    where
        F: FnOnce(&mut BuildReport) -> BuildResult<StepOutcome>,
    {
        report.state = step.state();
        report.update_step(step, StepStatus::Started, None);
        debug!(step = step.as_str(), "step started");

        match op(report) {
            Ok(outcome) => {
                let status = outcome.status();
                report.update_step(step, status, outcome.detail().map(str::to_string));
                info!(
                    step = step.as_str(),
                    status = status.as_str(),
                    detail = outcome.detail().unwrap_or_default(),
                    "step finished"
                );
                Ok(())
            }
            Err(err) => {
                report.update_step(step, StepStatus::Failed, Some(err.describe()));
                report.state = PipelineState::Failed;
                warn!(step = step.as_str(), error = %err.describe(), "step failed");
                Err(err)
            }
        }
    }

    fn clean(&self) -> BuildResult<StepOutcome> {
        let working_dir = &self.config.working_dir;
        let removed = self.fs.delete(working_dir)?;
        self.fs.create_dir_all(working_dir)?;
        Ok(if removed {
            StepOutcome::Completed(Some("previous contents removed".to_string()))
        } else {
            StepOutcome::Completed(None)
        })
    }

    /// Assemble one asset. Failures of required assets abort the run; other
    /// failures are recorded and yield `None`.
    fn assemble_asset(
        &self,
        report: &mut BuildReport,
        asset: &AssetId,
    ) -> BuildResult<Option<AssembledAsset>> {
        match self.assembler.assemble(asset) {
            Ok(assembled) => {
                record_outcome(report, asset, &assembled);
                Ok(Some(assembled))
            }
            Err(err) if asset.kind().is_required() => Err(required_failure(report, asset, err)),
            Err(err) => {
                warn!(asset = asset.label(), error = %err.describe(), "asset skipped");
                report.failures.push(AssetFailure::new(asset, &err));
                Ok(None)
            }
        }
    }

    fn assemble_plugins(
        &self,
        report: &mut BuildReport,
        plugins: &CuratedList,
        curated_folders: &mut BTreeSet<String>,
    ) -> BuildResult<StepOutcome> {
        if plugins.is_empty() {
            return Ok(StepOutcome::Skipped(Some("no curated plugins".to_string())));
        }

        let mut assembled_count = 0_usize;
        for slug in plugins.slugs() {
            let asset = AssetId::plugin(slug.as_str());
            if let Some(assembled) = self.assemble_asset(report, &asset)? {
                curated_folders.extend(assembled.summary.top_level.iter().cloned());
                assembled_count += 1;
            }
        }

        if assembled_count == 0 {
            return Err(BuildError::NoPluginsAssembled {
                attempted: plugins.len(),
            });
        }
        Ok(StepOutcome::Completed(Some(format!(
            "{assembled_count} of {} plugins",
            plugins.len()
        ))))
    }

    fn assemble_theme(&self, report: &mut BuildReport) -> BuildResult<StepOutcome> {
        let theme = AssetId::theme(self.config.theme_url.as_str());
        self.assemble_asset(report, &theme)?;
        match self.assembler.rename_theme() {
            Ok(ThemeRename::Renamed { from, to }) => {
                Ok(StepOutcome::Completed(Some(format!("{from} -> {to}"))))
            }
            Ok(ThemeRename::NoMatch) => Ok(StepOutcome::Completed(Some(
                "no theme folder renamed".to_string(),
            ))),
            Ok(ThemeRename::AlreadyCanonical) => Ok(StepOutcome::Completed(Some(
                "theme folder already canonical".to_string(),
            ))),
            Err(err) => Err(required_failure(report, &theme, err)),
        }
    }

    fn prune_plugins(&self, curated_folders: &BTreeSet<String>) -> BuildResult<StepOutcome> {
        let plugins_dir = self.assembler.plugins_dir();
        let mut removed = Vec::new();
        for entry in &self.config.layout.prune {
            if curated_folders.contains(entry) {
                debug!(entry = entry.as_str(), "curated entry kept");
                continue;
            }
            if self.fs.delete(&plugins_dir.join(entry))? {
                removed.push(entry.as_str());
            }
        }
        if removed.is_empty() {
            return Ok(StepOutcome::Skipped(None));
        }
        Ok(StepOutcome::Completed(Some(removed.join(", "))))
    }

    fn relocate(&self, kind: BundleKind, summary: ArchiveSummary) -> BuildResult<BundleArtifact> {
        let destination = self.output_path(&summary.path)?;
        self.fs.create_dir_all(&self.config.output_dir)?;
        self.fs.move_path(&summary.path, &destination, true)?;
        info!(
            bundle = ?kind,
            path = %destination.display(),
            sha256 = summary.sha256.as_str(),
            "bundle published"
        );
        Ok(BundleArtifact {
            kind,
            path: destination,
            entries: summary.entries,
            bytes: summary.bytes,
            sha256: summary.sha256,
        })
    }

    fn output_path(&self, bundle: &Path) -> BuildResult<PathBuf> {
        bundle
            .file_name()
            .map(|name| self.config.output_dir.join(name))
            .ok_or_else(|| BuildError::LayoutMissing {
                path: bundle.to_path_buf(),
            })
    }
}

fn record_outcome(report: &mut BuildReport, asset: &AssetId, assembled: &AssembledAsset) {
    report.assets.push(AssetOutcome {
        asset: asset.label().to_string(),
        kind: asset.kind(),
        url: assembled.descriptor.url.clone(),
        folders: assembled.summary.top_level.clone(),
        files: assembled.summary.files,
    });
}

fn required_failure(report: &mut BuildReport, asset: &AssetId, err: BuildError) -> BuildError {
    report.failures.push(AssetFailure::new(asset, &err));
    BuildError::RequiredAssetFailed {
        asset: asset.label().to_string(),
        source: Box::new(err),
    }
}
