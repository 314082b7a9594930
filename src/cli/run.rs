use anyhow::{Context, Result};
use log::info;
use mzgraph::builders::{AnnotationSource, RankingConfig};
use mzgraph::pipeline::{default_workers, Pipeline, PipelineConfig};

use super::config::Config;
use super::export::export_config;
use super::merge::merge_config;
use super::{finish, RunArgs};

/// Sources selected by flags; none selected means the config file's list,
/// then every source
fn selected_sources(args: &RunArgs, config: &Config) -> Vec<AnnotationSource> {
    let flags = [
        (args.sirius_structure, AnnotationSource::SiriusStructure),
        (args.sirius_class, AnnotationSource::SiriusClass),
        (args.spectral_library, AnnotationSource::SpectralLibrary),
        (args.molecular_networking, AnnotationSource::MolecularNetwork),
        (args.tima, AnnotationSource::Tima),
    ];
    let selected: Vec<AnnotationSource> = flags
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, source)| *source)
        .collect();
    if !selected.is_empty() {
        return selected;
    }
    config
        .run
        .sources
        .clone()
        .unwrap_or_else(|| AnnotationSource::ALL.to_vec())
}

fn ranking(args: &RunArgs, base: RankingConfig) -> RankingConfig {
    RankingConfig {
        sirius_structure: args.top_sirius_structure.unwrap_or(base.sirius_structure),
        sirius_class: args.top_sirius_class.unwrap_or(base.sirius_class),
        spectral_library: args.top_spectral_library.unwrap_or(base.spectral_library),
        tima: args.top_tima.unwrap_or(base.tima),
    }
}

/// Build, merge and optionally export every sample
pub fn run(args: RunArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let ionization = args
        .ionization
        .or(config.run.ionization)
        .unwrap_or_default();

    let mut pipeline_config = PipelineConfig::new(&args.root);
    pipeline_config.ionization = ionization;
    pipeline_config.sources = selected_sources(&args, &config);
    pipeline_config.ranking = ranking(&args, config.ranking);
    pipeline_config.workers = args
        .workers
        .or(config.run.workers)
        .unwrap_or_else(default_workers);
    pipeline_config.adducts = args.adducts.clone().or_else(|| config.run.adducts.clone());
    pipeline_config.merge = if args.no_merge {
        None
    } else {
        Some(merge_config(&args.merge, &config.merge, ionization.explicit())?)
    };
    pipeline_config.export = export_config(
        args.export.clone(),
        args.export_compress,
        args.delete_existing,
        &config.export,
    );

    info!(
        "Building {} sources for samples under {} ({} ionization)",
        pipeline_config.sources.len(),
        args.root.display(),
        ionization
    );
    let pipeline = Pipeline::new(pipeline_config).context("Failed to set up the run")?;
    let summary = pipeline
        .run()
        .with_context(|| format!("Run failed for {}", args.root.display()))?;
    finish(summary)
}
