//! Build service: trigger admission, run lock, pipeline and report persistence.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use govpress_config::BuildConfig;
use govpress_telemetry::RunSpanGuard;

use crate::error::{BuildError, BuildResult};
use crate::fetcher::Fetcher;
use crate::fs::{Filesystem, LocalFilesystem};
use crate::http::build_client;
use crate::layout::LayoutAssembler;
use crate::lock::RunLock;
use crate::model::BuildReport;
use crate::pipeline::PipelineDriver;
use crate::plugins::CuratedList;
use crate::resolver::{AssetResolver, MetadataSource, PluginApiClient};
use crate::trigger::{Trigger, TriggerGate};

/// Entry point shared by the scheduler and on-demand triggers.
pub struct BuildService {
    config: BuildConfig,
    fs: Arc<dyn Filesystem>,
    metadata: Arc<dyn MetadataSource>,
    fetcher: Fetcher,
    gate: TriggerGate,
}

impl BuildService {
    /// Service using the local disk and the configured plugin API.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::HttpClient`] when the HTTP client cannot be built.
    pub fn from_config(config: BuildConfig) -> BuildResult<Self> {
        let client = build_client(&config.http)?;
        let metadata = Arc::new(PluginApiClient::new(
            client.clone(),
            config.plugin_api.as_str(),
            &config.metadata,
        ));
        let fetcher = Fetcher::new(client);
        Ok(Self::with_parts(
            config,
            Arc::new(LocalFilesystem),
            metadata,
            fetcher,
        ))
    }

    /// Service assembled from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: BuildConfig,
        fs: Arc<dyn Filesystem>,
        metadata: Arc<dyn MetadataSource>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            config,
            fs,
            metadata,
            fetcher,
            gate: TriggerGate,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Download link the metadata service reports for `slug`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataUnavailable` or `NoDownloadLink`.
    pub fn resolve_plugin(&self, slug: &str) -> BuildResult<String> {
        self.metadata.download_link(slug)
    }

    /// Run the pipeline once.
    ///
    /// Pipeline failures are reported through `BuildReport::success`; the report is written
    /// to the configured report path either way.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Unauthorized`] for rejected triggers and
    /// [`BuildError::RunInProgress`] when another run holds the lock.
    pub fn run(&self, trigger: &Trigger) -> BuildResult<BuildReport> {
        self.gate.authorize(trigger)?;
        let _lock = RunLock::acquire(&self.config.lock_path())?;

        let run_id = Uuid::new_v4();
        let label = trigger.label();
        let _span = RunSpanGuard::enter(run_id, &label);
        let mut report = BuildReport::new(run_id, label);
        info!(name = self.config.name.as_str(), "build started");

        let result = CuratedList::load(&self.config.plugin_list)
            .and_then(|plugins| self.driver().run(&plugins, &mut report));
        report.finish(result.as_ref().map(|_| ()));

        if let Err(err) = persist_report(&self.config.report_path(), &report) {
            warn!(error = %err.describe(), "build report not written");
        }

        match &result {
            Ok(()) => info!(
                artifacts = report.artifacts.len(),
                failures = report.failures.len(),
                "build finished"
            ),
            Err(err) => warn!(
                kind = ?err.kind(),
                error = %err.describe(),
                "build failed"
            ),
        }
        Ok(report)
    }

    fn driver(&self) -> PipelineDriver {
        let assembler = LayoutAssembler::new(
            Arc::clone(&self.fs),
            AssetResolver::new(Arc::clone(&self.metadata)),
            self.fetcher.clone(),
            self.config.working_dir.clone(),
            self.config.layout.clone(),
        )
        .keep_local_packages(self.config.keep_local_packages);
        PipelineDriver::new(Arc::clone(&self.fs), assembler, self.config.clone())
    }
}

/// Write `report` as pretty JSON to `path`.
///
/// # Errors
///
/// Returns [`BuildError::Report`] or [`BuildError::Io`].
pub fn persist_report(path: &Path, report: &BuildReport) -> BuildResult<()> {
    let serialized = serde_json::to_string_pretty(report)
        .map_err(|err| BuildError::report("report.serialize", path, err))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| BuildError::io("report.create_parent", parent, err))?;
    }
    fs::write(path, serialized).map_err(|err| BuildError::io("report.write", path, err))
}

/// Read the report of the most recent run, if one was written.
///
/// # Errors
///
/// Returns [`BuildError::Report`] for an unparseable report and [`BuildError::Io`] when
/// an existing report cannot be read.
pub fn last_report(config: &BuildConfig) -> BuildResult<Option<BuildReport>> {
    let path = config.report_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(BuildError::io("report.read", &path, err)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| BuildError::report("report.parse", &path, err))
}
