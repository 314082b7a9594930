//! # Merge Engine
//!
//! Unions the fragments of one sample into a single content-addressed graph.
//!
//! 1. enumerate `<sample>/rdf/*.ttl`, excluding earlier merge artifacts and
//!    fragments of the other polarity when a filter is set
//! 2. parse every fragment; unparsable ones are logged and excluded
//! 3. union with set semantics and serialize deterministically
//! 4. name the result `{massive_id}_{sample_id}_merged_graph_{sha256}.ttl`
//! 5. remove superseded artifacts, then rename the new one into place
//! 6. record provenance in `graph_params.yaml`
//!
//! Serializing the same triple set always yields the same bytes, so merging
//! unchanged fragments again reproduces the same file name.

mod error;
pub mod provenance;


use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::graph::{GraphStore, Triple};
use crate::identifiers::{IdentifierError, IonizationMode, MASSIVE_ID_SENTINEL, WIKIDATA_NAMESPACE};
use crate::metadata::SampleMetadata;
use crate::table::is_missing;

pub use error::MergeError;
pub use provenance::{MergeRecord, PROVENANCE_FILE};

/// Marker shared by every merge artifact file name
pub const MERGED_MARKER: &str = "merged_graph";

/// Default compression threshold: 200 MB
pub const DEFAULT_COMPRESSION_THRESHOLD: u64 = 200_000_000;

/// Merge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Only merge fragments of this polarity
    pub ionization: Option<IonizationMode>,
    /// Store large artifacts as `.ttl.gz`
    pub compress: bool,
    /// Size (uncompressed bytes) from which an artifact is compressed
    pub compression_threshold_bytes: u64,
    /// Remove earlier merge artifacts of the sample
    pub cleanup: bool,
    /// Write `graph_params.yaml`
    pub provenance: bool,
    /// Record the git commit of the working directory
    pub use_git: bool,
    /// Revision recorded as is; takes precedence over `use_git`
    pub revision: Option<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            ionization: None,
            compress: false,
            compression_threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD,
            cleanup: true,
            provenance: true,
            use_git: false,
            revision: None,
        }
    }
}

/// Result of merging one sample
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub sample_id: String,
    /// Final path of the artifact (`.ttl` or `.ttl.gz`)
    pub artifact: PathBuf,
    /// SHA-256 of the uncompressed Turtle bytes
    pub sha256: String,
    pub triple_count: usize,
    /// Fragments that went into the union
    pub fragments: Vec<String>,
    /// Fragments excluded because they could not be parsed
    pub excluded: Vec<String>,
    pub compressed: bool,
    /// Superseded artifacts that were removed
    pub removed: Vec<PathBuf>,
}

/// True for file names produced by a merge
pub fn is_merge_artifact(file_name: &str) -> bool {
    file_name.contains(MERGED_MARKER)
}

/// Hex SHA-256 of serialized bytes
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `{massive_id}_{sample_id}_merged_graph_{hash}.ttl`
pub fn artifact_name(massive_id: &str, sample_id: &str, hash: &str) -> String {
    format!("{}_{}_{}_{}.ttl", massive_id, sample_id, MERGED_MARKER, hash)
}

/// Polarity encoded in a fragment name (`<source>_<ion>.ttl`)
pub fn fragment_ionization(file_name: &str) -> Option<IonizationMode> {
    let stem = file_name.strip_suffix(".ttl")?;
    let (_, ion) = stem.rsplit_once('_')?;
    ion.parse().ok()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Fragment files of an `rdf/` directory, sorted by name.
///
/// A missing directory has no fragments.
pub fn list_fragments(
    rdf_dir: &Path,
    ionization: Option<IonizationMode>,
) -> Result<Vec<PathBuf>, MergeError> {
    let entries = match fs::read_dir(rdf_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut fragments = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let name = file_name_of(&path);
        if !path.is_file() || !name.ends_with(".ttl") || is_merge_artifact(&name) {
            continue;
        }
        if let Some(mode) = ionization {
            if fragment_ionization(&name) != Some(mode) {
                continue;
            }
        }
        fragments.push(path);
    }
    fragments.sort();
    Ok(fragments)
}

/// Merge artifacts (`.ttl` and `.ttl.gz`) present in an `rdf/` directory
pub fn list_artifacts(rdf_dir: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let entries = match fs::read_dir(rdf_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut artifacts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let name = file_name_of(&path);
        if path.is_file()
            && is_merge_artifact(&name)
            && (name.ends_with(".ttl") || name.ends_with(".ttl.gz"))
        {
            artifacts.push(path);
        }
    }
    artifacts.sort();
    Ok(artifacts)
}

/// Per-sample merge with a fixed configuration
#[derive(Debug, Clone)]
pub struct MergeEngine {
    config: MergeConfig,
    revision: Option<String>,
}

impl MergeEngine {
    /// Create an engine; the git revision, if requested, is looked up once
    pub fn new(config: MergeConfig) -> Self {
        let revision = match (&config.revision, config.use_git) {
            (Some(revision), _) => Some(revision.clone()),
            (None, true) => {
                let revision = provenance::git_revision();
                if revision.is_none() {
                    warn!("No git revision found in the working directory");
                }
                revision
            }
            (None, false) => None,
        };
        Self { config, revision }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge the fragments of one sample.
    ///
    /// Returns `Ok(None)` when the sample has no metadata or no fragment to
    /// merge; such samples are skipped.
    pub fn merge_sample(&self, sample_dir: &Path) -> Result<Option<MergeOutcome>, MergeError> {
        let dir_name = file_name_of(sample_dir);
        let Some(metadata) = SampleMetadata::load(sample_dir)? else {
            warn!("{}: no sample metadata, merge skipped", dir_name);
            return Ok(None);
        };
        let sample_id = metadata
            .sample_id
            .clone()
            .ok_or(IdentifierError::MissingSampleId)?;
        let massive_id = metadata
            .massive_id
            .as_deref()
            .filter(|m| !is_missing(m))
            .unwrap_or(MASSIVE_ID_SENTINEL);

        let rdf_dir = sample_dir.join("rdf");
        let fragment_paths = list_fragments(&rdf_dir, self.config.ionization)?;
        if fragment_paths.is_empty() {
            info!("{}: no fragments to merge, skipped", dir_name);
            return Ok(None);
        }

        let mut store = GraphStore::new();
        store.bind("wd", WIKIDATA_NAMESPACE);
        let mut union: BTreeSet<Triple> = BTreeSet::new();
        let mut fragments = Vec::new();
        let mut excluded = Vec::new();
        let mut modes = BTreeSet::new();

        for path in &fragment_paths {
            let name = file_name_of(path);
            match GraphStore::from_file(path) {
                Ok(fragment) => {
                    for (prefix, namespace) in fragment.prefixes() {
                        if !store.prefixes().contains_key(prefix) {
                            store.bind(prefix.clone(), namespace.clone());
                        }
                    }
                    union.extend(fragment.triples().iter().cloned());
                    modes.extend(fragment_ionization(&name));
                    fragments.push(name);
                }
                Err(e) => {
                    warn!("{}: fragment {} excluded: {}", dir_name, name, e);
                    excluded.push(name);
                }
            }
        }

        if union.is_empty() {
            warn!("{}: fragments hold no triples, merge skipped", dir_name);
            return Ok(None);
        }

        let bytes = store.serialize_set(&union).into_bytes();
        let sha256 = content_hash(&bytes);
        let base_name = artifact_name(massive_id, &sample_id, &sha256);
        let compressed =
            self.config.compress && bytes.len() as u64 >= self.config.compression_threshold_bytes;
        let file_name = if compressed {
            format!("{}.gz", base_name)
        } else {
            base_name
        };
        let artifact = rdf_dir.join(&file_name);

        let persist_error = |source| MergeError::Persist {
            path: artifact.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&rdf_dir).map_err(persist_error)?;
        if compressed {
            let mut encoder = GzEncoder::new(&mut tmp, Compression::default());
            encoder.write_all(&bytes).map_err(persist_error)?;
            encoder.finish().map_err(persist_error)?;
        } else {
            tmp.write_all(&bytes).map_err(persist_error)?;
        }

        let mut removed = Vec::new();
        if self.config.cleanup {
            for stale in list_artifacts(&rdf_dir)? {
                // an identical artifact is replaced by the rename below
                if stale == artifact {
                    continue;
                }
                fs::remove_file(&stale)?;
                debug!("{}: removed {}", dir_name, stale.display());
                removed.push(stale);
            }
        }
        tmp.persist(&artifact).map_err(|e| persist_error(e.error))?;

        let ionization_modes: Vec<IonizationMode> = modes.into_iter().collect();
        if self.config.provenance {
            let record = MergeRecord::now(
                file_name.clone(),
                sha256.clone(),
                union.len(),
                fragments.clone(),
                ionization_modes,
                self.revision.clone(),
            );
            provenance::write_record(&rdf_dir, &provenance::record_key(&sample_id), &record)?;
        }

        info!(
            "{}: merged {} fragments into {} ({} triples)",
            dir_name,
            fragments.len(),
            file_name,
            union.len()
        );
        Ok(Some(MergeOutcome {
            sample_id,
            artifact,
            sha256,
            triple_count: union.len(),
            fragments,
            excluded,
            compressed,
            removed,
        }))
    }
}
