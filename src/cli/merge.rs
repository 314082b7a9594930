use anyhow::{ensure, Context, Result};
use log::info;
use mzgraph::identifiers::IonizationMode;
use mzgraph::merge::{MergeConfig, DEFAULT_COMPRESSION_THRESHOLD};
use mzgraph::pipeline::{default_workers, Pipeline, PipelineConfig};

use super::config::{Config, MergeSection};
use super::{finish, MergeArgs, MergeCommand};

const BYTES_PER_MB: f64 = 1_000_000.0;

/// Combine merge flags with the config file; flags win
pub(super) fn merge_config(
    args: &MergeArgs,
    section: &MergeSection,
    ionization: Option<IonizationMode>,
) -> Result<MergeConfig> {
    let compression_threshold_bytes = match args.gzip_size.or(section.gzip_size_mb) {
        Some(mb) => {
            ensure!(
                mb.is_finite() && mb >= 0.0,
                "gzip size must be a non-negative number of MB, got {}",
                mb
            );
            (mb * BYTES_PER_MB) as u64
        }
        None => DEFAULT_COMPRESSION_THRESHOLD,
    };

    Ok(MergeConfig {
        ionization: ionization.or(section.ionization),
        compress: args.compress || section.compress.unwrap_or(false),
        compression_threshold_bytes,
        cleanup: !args.keep_previous && section.cleanup.unwrap_or(true),
        provenance: !args.no_provenance && section.provenance.unwrap_or(true),
        use_git: args.use_git || section.use_git.unwrap_or(false),
        revision: args.revision.clone().or_else(|| section.revision.clone()),
    })
}

/// Merge the fragments of every sample
pub fn run(args: MergeCommand) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let mut pipeline_config = PipelineConfig::new(&args.root);
    pipeline_config.sources.clear();
    pipeline_config.workers = args
        .workers
        .or(config.run.workers)
        .unwrap_or_else(default_workers);
    pipeline_config.merge = Some(merge_config(&args.merge, &config.merge, args.ionization)?);
    pipeline_config.export = None;

    info!("Merging samples under {}", args.root.display());
    let pipeline = Pipeline::new(pipeline_config).context("Failed to set up the merge")?;
    let summary = pipeline
        .run()
        .with_context(|| format!("Merge failed for {}", args.root.display()))?;
    finish(summary)
}
