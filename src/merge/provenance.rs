//! Provenance sidecar (`graph_params.yaml`)
//!
//! The sidecar is a YAML mapping with one entry per merged graph, keyed
//! `{sample_id}_merged_graph`. Writing a record replaces the entry of that
//! key only; entries under other keys are carried over untouched. A sample
//! therefore keeps exactly one record, the one of its latest merge.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::MergeError;
use crate::identifiers::IonizationMode;

/// File name of the sidecar inside `<sample>/rdf/`
pub const PROVENANCE_FILE: &str = "graph_params.yaml";

/// Sidecar key of a sample's merged graph
pub fn record_key(sample_id: &str) -> String {
    format!("{}_merged_graph", sample_id)
}

/// How one merged graph was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// File name of the merged artifact
    pub artifact: String,
    /// SHA-256 of the uncompressed Turtle bytes
    pub sha256: String,
    pub triple_count: usize,
    /// Fragment file names that went into the union
    pub fragments: Vec<String>,
    pub ionization_modes: Vec<IonizationMode>,
    /// RFC 3339 UTC timestamp
    pub created_at: String,
    pub tool_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl MergeRecord {
    /// Stamp a record with the current time and crate version
    pub fn now(
        artifact: impl Into<String>,
        sha256: impl Into<String>,
        triple_count: usize,
        fragments: Vec<String>,
        ionization_modes: Vec<IonizationMode>,
        revision: Option<String>,
    ) -> Self {
        Self {
            artifact: artifact.into(),
            sha256: sha256.into(),
            triple_count,
            fragments,
            ionization_modes,
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            revision,
        }
    }
}

fn sidecar_path(rdf_dir: &Path) -> PathBuf {
    rdf_dir.join(PROVENANCE_FILE)
}

fn read_mapping(path: &Path) -> Result<Mapping, MergeError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Mapping::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    serde_yaml::from_str(&content).map_err(|source| MergeError::Provenance {
        path: path.to_path_buf(),
        source,
    })
}

/// Insert or replace the record of `key`, keeping every other entry
pub fn write_record(rdf_dir: &Path, key: &str, record: &MergeRecord) -> Result<(), MergeError> {
    let path = sidecar_path(rdf_dir);
    let yaml_error = |source| MergeError::Provenance {
        path: path.clone(),
        source,
    };

    let mut mapping = read_mapping(&path)?;
    let value = serde_yaml::to_value(record).map_err(yaml_error)?;
    mapping.insert(Value::String(key.to_string()), value);
    let content = serde_yaml::to_string(&mapping).map_err(yaml_error)?;

    let persist_error = |source| MergeError::Persist {
        path: path.clone(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(rdf_dir).map_err(persist_error)?;
    tmp.write_all(content.as_bytes()).map_err(persist_error)?;
    tmp.persist(&path).map_err(|e| persist_error(e.error))?;

    debug!("recorded {} in {}", key, path.display());
    Ok(())
}

/// Record of `key`, `Ok(None)` when the sidecar or the entry is absent
pub fn read_record(rdf_dir: &Path, key: &str) -> Result<Option<MergeRecord>, MergeError> {
    let path = sidecar_path(rdf_dir);
    let mapping = read_mapping(&path)?;
    match mapping.get(key) {
        Some(value) => serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|source| MergeError::Provenance { path, source }),
        None => Ok(None),
    }
}

/// Commit of the git checkout in the working directory, if any
pub fn git_revision() -> Option<String> {
    let output = match Command::new("git").args(["rev-parse", "HEAD"]).output() {
        Ok(output) => output,
        Err(e) => {
            debug!("git revision unavailable: cannot run git ({})", e);
            return None;
        }
    };
    if !output.status.success() {
        debug!(
            "git revision unavailable: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if revision.is_empty() {
        debug!("git revision unavailable: empty output");
        return None;
    }
    Some(revision)
}
