//! # Export Stage
//!
//! Gathers the merged graph of every sample into one target directory.
//! Only merge artifacts are exported. Each sample contributes at most one
//! file, named after its artifact, so concurrent exports never collide.

mod error;

#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::identifiers::{IonizationMode, MASSIVE_ID_SENTINEL};
use crate::merge::{self, is_merge_artifact, provenance, MergeRecord, MERGED_MARKER};
use crate::metadata::SampleMetadata;
use crate::table::is_missing;

pub use error::ExportError;

/// Export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving every exported graph
    pub target_dir: PathBuf,
    /// Only export graphs holding this polarity
    #[serde(default)]
    pub ionization: Option<IonizationMode>,
    /// Gzip plain artifacts while copying
    #[serde(default)]
    pub compress: bool,
    /// Remove exported `.ttl.gz` graphs from the target before copying
    #[serde(default)]
    pub purge: bool,
}

impl ExportConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ionization: None,
            compress: false,
            purge: false,
        }
    }
}

/// Copies merge artifacts into the target directory
#[derive(Debug, Clone)]
pub struct ExportStage {
    config: ExportConfig,
}

impl ExportStage {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Create the target directory and purge stale graphs if requested.
    ///
    /// Without an ionization filter every exported `.ttl.gz` graph is
    /// purged. With one, only graphs of the `samples` holding that polarity
    /// are, so exports of the other polarity survive.
    ///
    /// Returns the number of purged files. Runs once, before any sample.
    pub fn prepare(&self, samples: &[PathBuf]) -> Result<usize, ExportError> {
        let target = &self.config.target_dir;
        fs::create_dir_all(target)?;
        if !self.config.purge {
            return Ok(0);
        }

        let prefixes = match self.config.ionization {
            Some(mode) => {
                let mut prefixes = Vec::new();
                for sample_dir in samples {
                    let (prefix, record) = sample_state(sample_dir)?;
                    let Some(prefix) = prefix else { continue };
                    if holds_ionization(&sample_dir.join("rdf"), record.as_ref(), mode)? {
                        prefixes.push(prefix);
                    }
                }
                Some(prefixes)
            }
            None => None,
        };

        let mut purged = 0;
        for entry in fs::read_dir(target)? {
            let path = entry?.path();
            let name = file_name_of(&path);
            if !(path.is_file() && is_merge_artifact(&name) && name.ends_with(".ttl.gz")) {
                continue;
            }
            if let Some(prefixes) = &prefixes {
                if !prefixes.iter().any(|p| name.starts_with(p.as_str())) {
                    continue;
                }
            }
            fs::remove_file(&path)?;
            debug!("purged {}", path.display());
            purged += 1;
        }
        if purged > 0 {
            info!("Purged {} stale graphs from {}", purged, target.display());
        }
        Ok(purged)
    }

    /// Export the merged graph of one sample.
    ///
    /// Returns `Ok(None)` when the sample has no artifact or does not match
    /// the ionization filter.
    pub fn export_sample(&self, sample_dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        let dir_name = file_name_of(sample_dir);
        let rdf_dir = sample_dir.join("rdf");
        let (_, record) = sample_state(sample_dir)?;

        let Some(artifact) = select_artifact(&rdf_dir, record.as_ref())? else {
            warn!("{}: no merged graph, export skipped", dir_name);
            return Ok(None);
        };

        if let Some(mode) = self.config.ionization {
            if !holds_ionization(&rdf_dir, record.as_ref(), mode)? {
                debug!("{}: no {} data, export skipped", dir_name, mode);
                return Ok(None);
            }
        }

        let name = file_name_of(&artifact);
        let gzip = self.config.compress && !name.ends_with(".gz");
        let target_name = if gzip { format!("{}.gz", name) } else { name };
        let target = self.config.target_dir.join(&target_name);

        let persist_error = |source| ExportError::Persist {
            path: target.clone(),
            source,
        };
        let mut input = BufReader::new(File::open(&artifact)?);
        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.config.target_dir).map_err(persist_error)?;
        if gzip {
            let mut encoder = GzEncoder::new(&mut tmp, Compression::default());
            io::copy(&mut input, &mut encoder).map_err(persist_error)?;
            encoder.finish().map_err(persist_error)?;
        } else {
            io::copy(&mut input, &mut tmp).map_err(persist_error)?;
        }
        tmp.persist(&target).map_err(|e| persist_error(e.error))?;

        info!("{}: exported {}", dir_name, target_name);
        Ok(Some(target))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Artifact name prefix and provenance record of a sample.
///
/// Both are `None` when the metadata is absent or unreadable.
fn sample_state(sample_dir: &Path) -> Result<(Option<String>, Option<MergeRecord>), ExportError> {
    let metadata = match SampleMetadata::load(sample_dir) {
        Ok(Some(metadata)) => metadata,
        Ok(None) => return Ok((None, None)),
        Err(e) => {
            debug!(
                "{}: metadata unreadable ({}), no provenance used",
                file_name_of(sample_dir),
                e
            );
            return Ok((None, None));
        }
    };
    let Some(sample_id) = metadata.sample_id.as_deref() else {
        return Ok((None, None));
    };
    let massive_id = metadata
        .massive_id
        .as_deref()
        .filter(|m| !is_missing(m))
        .unwrap_or(MASSIVE_ID_SENTINEL);
    let prefix = format!("{}_{}_{}_", massive_id, sample_id, MERGED_MARKER);
    let record = provenance::read_record(&sample_dir.join("rdf"), &provenance::record_key(sample_id))?;
    Ok((Some(prefix), record))
}

/// The artifact named by the provenance record, else the newest artifact
fn select_artifact(
    rdf_dir: &Path,
    record: Option<&MergeRecord>,
) -> Result<Option<PathBuf>, ExportError> {
    if let Some(record) = record {
        let recorded = rdf_dir.join(&record.artifact);
        if recorded.is_file() {
            return Ok(Some(recorded));
        }
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for path in merge::list_artifacts(rdf_dir)? {
        let modified = fs::metadata(&path)?.modified()?;
        // ties keep the first name in sorted order
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Whether a sample's merged graph holds data of `mode`.
///
/// Uses the provenance record, else the fragments present next to the
/// artifact.
fn holds_ionization(
    rdf_dir: &Path,
    record: Option<&MergeRecord>,
    mode: IonizationMode,
) -> Result<bool, ExportError> {
    if let Some(record) = record {
        return Ok(record.ionization_modes.contains(&mode));
    }
    Ok(!merge::list_fragments(rdf_dir, Some(mode))?.is_empty())
}
