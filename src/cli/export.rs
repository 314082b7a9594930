use anyhow::{Context, Result};
use log::info;
use mzgraph::export::ExportConfig;
use mzgraph::pipeline::{default_workers, Pipeline, PipelineConfig};
use std::path::PathBuf;

use super::config::{Config, ExportSection};
use super::{finish, ExportCommand};

/// Combine export flags with the config file; flags win
pub(super) fn export_config(
    target: Option<PathBuf>,
    compress: bool,
    delete_existing: bool,
    section: &ExportSection,
) -> Option<ExportConfig> {
    let target_dir = target.or_else(|| section.target_dir.clone())?;
    Some(ExportConfig {
        target_dir,
        ionization: section.ionization,
        compress: compress || section.compress.unwrap_or(false),
        purge: delete_existing || section.purge.unwrap_or(false),
    })
}

/// Copy every merged graph into the target directory
pub fn run(args: ExportCommand) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let mut export = export_config(
        args.target.clone(),
        args.compress,
        args.delete_existing,
        &config.export,
    )
    .context("No export directory given (TARGET or [export] target_dir)")?;
    if args.ionization.is_some() {
        export.ionization = args.ionization;
    }

    let mut pipeline_config = PipelineConfig::new(&args.root);
    pipeline_config.sources.clear();
    pipeline_config.merge = None;
    pipeline_config.workers = args
        .workers
        .or(config.run.workers)
        .unwrap_or_else(default_workers);

    info!(
        "Exporting merged graphs under {} to {}",
        args.root.display(),
        export.target_dir.display()
    );
    pipeline_config.export = Some(export);

    let pipeline = Pipeline::new(pipeline_config).context("Failed to set up the export")?;
    let summary = pipeline
        .run()
        .with_context(|| format!("Export failed for {}", args.root.display()))?;
    finish(summary)
}
