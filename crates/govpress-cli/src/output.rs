//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use govpress_build::{BuildReport, BundleKind};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_report(report: &BuildReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => print!("{}", report_table(report)),
    }
    Ok(())
}

pub(crate) fn render_status(report: Option<&BuildReport>, format: OutputFormat) -> CliResult<()> {
    match (report, format) {
        (report, OutputFormat::Json) => print_json(&report)?,
        (Some(report), OutputFormat::Table) => print!("{}", report_table(report)),
        (None, OutputFormat::Table) => println!("no build has run yet"),
    }
    Ok(())
}

pub(crate) fn render_link(slug: &str, link: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "slug": slug,
            "download_link": link,
        }))?,
        OutputFormat::Table => println!("{slug}: {link}"),
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn report_table(report: &BuildReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "run: {}", report.run_id);
    let _ = writeln!(out, "trigger: {}", report.trigger);
    let _ = writeln!(
        out,
        "result: {}",
        if report.success { "success" } else { "failed" }
    );
    let _ = writeln!(out, "state: {}", report.state.as_str());
    let _ = writeln!(out, "started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        let elapsed = finished - report.started_at;
        let _ = writeln!(
            out,
            "finished: {} ({})",
            finished.to_rfc3339(),
            format_millis(elapsed.num_milliseconds())
        );
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "error: [{}] {}", error.kind.as_str(), error.message);
    }

    if !report.steps.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<18} {:<10} DETAIL", "STEP", "STATUS");
        for step in &report.steps {
            let _ = writeln!(
                out,
                "{:<18} {:<10} {}",
                step.name,
                step.status.as_str(),
                step.detail.as_deref().unwrap_or("-")
            );
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<28} {:<8} {:<22} MESSAGE", "ASSET", "KIND", "FAILURE");
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "{:<28} {:<8} {:<22} {}",
                failure.asset,
                failure.kind.as_str(),
                failure.failure.as_str(),
                failure.message
            );
        }
    }

    if !report.artifacts.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:<8} {:>7} {:>10} {:<16} PATH", "BUNDLE", "ENTRIES", "SIZE", "SHA256");
        for artifact in &report.artifacts {
            let _ = writeln!(
                out,
                "{:<8} {:>7} {:>10} {:<16} {}",
                bundle_label(artifact.kind),
                artifact.entries,
                format_bytes(artifact.bytes),
                short_digest(&artifact.sha256),
                artifact.path.display()
            );
        }
    }
    out
}

const fn bundle_label(kind: BundleKind) -> &'static str {
    match kind {
        BundleKind::Full => "full",
        BundleKind::Plugins => "plugins",
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..16).unwrap_or(digest)
}

fn format_millis(millis: i64) -> String {
    if millis < 1_000 {
        format!("{millis}ms")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let seconds = millis as f64 / 1_000.0;
        format!("{seconds:.1}s")
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
