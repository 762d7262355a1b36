//! Span helpers that tag every log line of a build run.
//!
//! # Design
//! - One `build` span per run carrying the run identifier and trigger label.
//! - The guard owns the span so callers keep it alive with a single binding.

use tracing::span::EnteredSpan;

use crate::init::build_version;

/// Guard that keeps the run span entered until dropped.
pub struct RunSpanGuard {
    _entered: EnteredSpan,
}

impl RunSpanGuard {
    /// Enter a `build` span for one pipeline run.
    #[must_use]
    pub fn enter(run_id: impl std::fmt::Display, trigger: &str) -> Self {
        let span = tracing::info_span!(
            "build",
            run_id = %run_id,
            trigger = %trigger,
            version = %build_version()
        );
        Self {
            _entered: span.entered(),
        }
    }
}
