//! # Pipeline
//!
//! Runs the three waves over every sample directory under a data root:
//!
//! 1. **build**: resolve polarity, then run each selected builder and
//!    write its fragment
//! 2. **merge**: union the fragments of each sample
//! 3. **export**: copy each sample's merged graph into one directory
//!
//! Waves run strictly in order. Within a wave, samples run in parallel on a
//! bounded rayon pool; a failing or panicking task is reported for its
//! sample and never stops the others. Failed tasks are not retried.

mod error;
mod report;

use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::builders::{
    polarity, remove_fragment, write_fragment, AnnotationSource, BuildContext, RankingConfig,
};
use crate::export::{ExportConfig, ExportStage};
use crate::identifiers::{IdentifierDeriver, IonizationSetting};
use crate::merge::{MergeConfig, MergeEngine};
use crate::metadata::{AdductTable, SampleMetadata};

pub use error::PipelineError;
pub use report::{RunSummary, SampleOutcome, TaskStatus, Wave, WaveReport};

/// Half the available processing units, rounded up
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 1) / 2
}

/// Everything a run needs; no path is resolved against the working directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding one subdirectory per sample
    pub root: PathBuf,
    pub ionization: IonizationSetting,
    /// Sources built in wave 1; empty skips the wave
    pub sources: Vec<AnnotationSource>,
    pub ranking: RankingConfig,
    pub workers: usize,
    /// Wave 2 settings; `None` skips the wave
    pub merge: Option<MergeConfig>,
    /// Wave 3 settings; `None` skips the wave
    pub export: Option<ExportConfig>,
    /// JSON adduct normalization table
    pub adducts: Option<PathBuf>,
}

impl PipelineConfig {
    /// Every source, automatic polarity, merge without export
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ionization: IonizationSetting::Auto,
            sources: AnnotationSource::ALL.to_vec(),
            ranking: RankingConfig::default(),
            workers: default_workers(),
            merge: Some(MergeConfig::default()),
            export: None,
            adducts: None,
        }
    }
}

/// Fragments written and sources skipped for one sample
#[derive(Debug, Clone, Default)]
pub struct SampleBuild {
    pub fragments: Vec<PathBuf>,
    /// Sources skipped, with the reason
    pub skipped: Vec<(AnnotationSource, String)>,
    /// Rows skipped across every source
    pub rows_skipped: usize,
}

impl SampleBuild {
    fn status(&self) -> TaskStatus {
        let mut notes: Vec<String> = self
            .skipped
            .iter()
            .map(|(source, reason)| format!("{} skipped ({})", source, reason))
            .collect();
        if self.rows_skipped > 0 {
            notes.push(format!("{} rows skipped", self.rows_skipped));
        }
        if notes.is_empty() {
            TaskStatus::Ok
        } else {
            TaskStatus::Warning(notes.join("; "))
        }
    }
}

/// A configured run over a data root
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    adducts: AdductTable,
}

impl Pipeline {
    /// Create a pipeline, loading the adduct table once
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let adducts = match &config.adducts {
            Some(path) => {
                let table = AdductTable::from_json_file(path)?;
                info!("Loaded {} adduct aliases from {}", table.len(), path.display());
                table
            }
            None => AdductTable::identity(),
        };
        Ok(Self { config, adducts })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Sample directories under the root, sorted; hidden entries are ignored
    pub fn discover_samples(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(PipelineError::RootNotFound(root.clone()));
        }
        let mut samples = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() && !sample_name(&path).starts_with('.') {
                samples.push(path);
            }
        }
        samples.sort();
        Ok(samples)
    }

    /// Run every configured wave
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let samples = self.discover_samples()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
        info!(
            "{} samples under {}, {} workers",
            samples.len(),
            self.config.root.display(),
            self.config.workers.max(1)
        );

        let mut summary = RunSummary::new(samples.len());
        // Samples whose fragments may be partial; later waves leave them alone
        let mut failed_builds: HashSet<String> = HashSet::new();

        if !self.config.sources.is_empty() {
            let report = run_wave(&pool, Wave::Build, &samples, |dir| {
                match self.build_sample(dir) {
                    Ok(build) => build.status(),
                    Err(e) => TaskStatus::Failed(e.to_string()),
                }
            });
            failed_builds.extend(
                report
                    .outcomes
                    .iter()
                    .filter(|o| o.status.is_failed())
                    .map(|o| o.sample.clone()),
            );
            summary.waves.push(report);
        }

        if let Some(config) = &self.config.merge {
            let engine = MergeEngine::new(config.clone());
            let report = run_wave(&pool, Wave::Merge, &samples, |dir| {
                if failed_builds.contains(&sample_name(dir)) {
                    return TaskStatus::Warning("build failed, merge skipped".to_string());
                }
                match engine.merge_sample(dir) {
                    Ok(Some(outcome)) if !outcome.excluded.is_empty() => TaskStatus::Warning(
                        format!("excluded unparsable fragments: {}", outcome.excluded.join(", ")),
                    ),
                    Ok(Some(_)) => TaskStatus::Ok,
                    Ok(None) => TaskStatus::Warning("nothing to merge".to_string()),
                    Err(e) => TaskStatus::Failed(e.to_string()),
                }
            });
            summary.waves.push(report);
        }

        if let Some(config) = &self.config.export {
            let stage = ExportStage::new(config.clone());
            stage.prepare(&samples)?;
            let report = run_wave(&pool, Wave::Export, &samples, |dir| {
                if failed_builds.contains(&sample_name(dir)) {
                    return TaskStatus::Warning("build failed, export skipped".to_string());
                }
                match stage.export_sample(dir) {
                    Ok(Some(_)) => TaskStatus::Ok,
                    Ok(None) => TaskStatus::Warning("no merged graph exported".to_string()),
                    Err(e) => TaskStatus::Failed(e.to_string()),
                }
            });
            summary.waves.push(report);
        }

        Ok(summary)
    }

    /// Wave 1 for one sample.
    ///
    /// Missing sources and columns are skipped; metadata, identifier and
    /// polarity errors abort the sample.
    pub fn build_sample(&self, sample_dir: &Path) -> Result<SampleBuild, PipelineError> {
        let name = sample_name(sample_dir);
        let metadata = SampleMetadata::load(sample_dir)?
            .ok_or_else(|| PipelineError::MissingMetadata(sample_dir.to_path_buf()))?;
        let ionization_mode = polarity::resolve_polarity(sample_dir, self.config.ionization)?;
        let deriver = IdentifierDeriver::new(metadata.to_sample(ionization_mode)?);

        let ctx = BuildContext {
            sample_dir,
            sample_name: &name,
            deriver: &deriver,
            adducts: &self.adducts,
            ranking: &self.config.ranking,
        };

        let mut build = SampleBuild::default();
        for source in &self.config.sources {
            match source.builder().build(&ctx) {
                Ok(fragment) => {
                    build.rows_skipped += fragment.stats.rows_skipped;
                    if let Some(path) = write_fragment(&ctx, &fragment)? {
                        build.fragments.push(path);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{}: {} skipped: {}", name, source, e);
                    remove_fragment(&ctx, *source)?;
                    build.skipped.push((*source, e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            "{}: {} fragments ({}), {} sources skipped",
            name,
            build.fragments.len(),
            ionization_mode,
            build.skipped.len()
        );
        Ok(build)
    }
}

fn sample_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one task per sample on the pool; outcomes keep sample order
fn run_wave<F>(pool: &ThreadPool, wave: Wave, samples: &[PathBuf], task: F) -> WaveReport
where
    F: Fn(&Path) -> TaskStatus + Sync,
{
    info!("Wave {}: {} samples", wave, samples.len());
    let outcomes: Vec<SampleOutcome> = pool.install(|| {
        samples
            .par_iter()
            .map(|dir| {
                let status = panic::catch_unwind(AssertUnwindSafe(|| task(dir)))
                    .unwrap_or_else(|payload| {
                        TaskStatus::Failed(format!("task panicked: {}", panic_message(&*payload)))
                    });
                SampleOutcome::new(sample_name(dir), status)
            })
            .collect()
    });

    let mut report = WaveReport::new(wave);
    for outcome in outcomes {
        if let TaskStatus::Failed(reason) = &outcome.status {
            warn!("Wave {}: {} failed: {}", wave, outcome.sample, reason);
        }
        report.add(outcome);
    }
    info!(
        "Wave {} done: {} ok, {} warnings, {} failed",
        wave,
        report.success_count(),
        report.warning_count(),
        report.failure_count()
    );
    report
}
