#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! GovPress bundle builder.
//!
//! Downloads the platform core, the curated plugins and the theme, assembles them in a
//! working directory and publishes `<Name>.zip` and `<Name>-Plugins.zip`.
//!
//! Layout: `resolver.rs` (download links), `fetcher.rs` (downloads), `unpack.rs`
//! (extraction), `layout.rs` (placement and theme rename), `archive.rs` (bundle writer),
//! `pipeline.rs` (step driver), `service.rs` (run entry point), `schedule.rs` and
//! `trigger.rs` (who starts runs and when).

pub mod archive;
pub mod error;
pub mod fetcher;
pub mod fs;
pub mod http;
pub mod layout;
pub mod lock;
pub mod model;
pub mod pipeline;
pub mod plugins;
pub mod resolver;
pub mod schedule;
pub mod service;
pub mod trigger;
pub mod unpack;

pub use archive::{ArchiveSummary, archive_dir, archive_dir_nested, sha256_hex};
pub use error::{BuildError, BuildResult, MetadataFailure};
pub use fetcher::{FetchedPackage, Fetcher, PackageOrigin, is_remote};
pub use fs::{DirEntryInfo, Filesystem, LocalFilesystem};
pub use http::build_client;
pub use layout::{AssembledAsset, LayoutAssembler, ThemeRename, rename_theme_folder};
pub use lock::RunLock;
pub use model::{
    AssetFailure, AssetId, AssetKind, AssetOutcome, BuildReport, BundleArtifact, BundleKind,
    DownloadDescriptor, FailureKind, PipelineState, RunError, StepKind, StepRecord, StepStatus,
};
pub use pipeline::PipelineDriver;
pub use plugins::CuratedList;
pub use resolver::{AssetResolver, MetadataSource, PluginApiClient};
pub use schedule::{
    DAILY_BUILD_JOB, JobCallback, RecurringJob, Scheduler, daily_build_job, register_daily_build,
    unregister_daily_build,
};
pub use service::{BuildService, last_report, persist_report};
pub use trigger::{Capability, Principal, Trigger, TriggerGate, principal_for};
pub use unpack::{UnpackSummary, Unpacker};
