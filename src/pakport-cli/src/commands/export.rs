//! Export command handler

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use pakport::{
    ExportOptions, ExportOrchestrator, ExportReport, ExportStage, ProgressSink, ResourceId,
};
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;

/// Progress bar over the extraction stage
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressSink for BarProgress {
    fn stage(&self, stage: ExportStage) {
        self.bar.set_message(stage.to_string());
    }

    fn start(&self, total: u64) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
    }

    fn advance(&self, _id: ResourceId) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

pub fn handle(
    source: &Path,
    output: &Path,
    threads: Option<usize>,
    keep_raw: bool,
    config: &Config,
) -> Result<()> {
    let catalog = config.catalog()?;
    let options = ExportOptions {
        layout: config.layout.clone(),
        keep_raw: keep_raw || config.keep_raw,
        threads: config.threads(threads),
        ..Default::default()
    };

    let report = ExportOrchestrator::new(output, &catalog, options)
        .with_progress(Arc::new(BarProgress::new()))
        .run(Some(source))
        .with_context(|| {
            format!(
                "Failed to export {} into {}",
                source.display(),
                output.display()
            )
        })?;

    print_report(&report, output);
    Ok(())
}

fn print_report(report: &ExportReport, output: &Path) {
    if let Some(name) = &report.game_name {
        eprintln!("Game: {}", name);
    }
    for archive in &report.malformed {
        warn!("Skipped {}: {}", archive.path.display(), archive.reason);
    }
    for failure in &report.failures {
        warn!("{}: {}", failure.id, failure.message);
    }

    eprintln!(
        "Exported {} of {} resources from {} archives to {:?} ({} already exported, {} failed)",
        report.exported,
        report.resources,
        report.archives,
        output,
        report.skipped,
        report.failures.len()
    );
}
