use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use super::MetadataError;
use crate::identifiers::{IdentifierError, IonizationMode, Sample};
use crate::table::is_missing;

/// Per-sample metadata record (`metadata.tsv`)
///
/// Only the first data row is used; one sample directory describes one
/// physical specimen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Sample identifier (required to derive identifiers)
    pub sample_id: Option<String>,

    /// Public dataset identifier (MassIVE), if any
    pub massive_id: Option<String>,

    /// Every other column of the record
    pub attributes: BTreeMap<String, String>,
}

impl SampleMetadata {
    /// Canonical metadata file name inside a sample directory
    pub const FILE_NAME: &'static str = "metadata.tsv";

    /// Locate the metadata file of a sample directory.
    ///
    /// Looks for `metadata.tsv`, then `{directory}_metadata.tsv`.
    pub fn locate(sample_dir: &Path) -> Option<PathBuf> {
        let canonical = sample_dir.join(Self::FILE_NAME);
        if canonical.is_file() {
            return Some(canonical);
        }
        let name = sample_dir.file_name()?.to_string_lossy();
        let prefixed = sample_dir.join(format!("{}_metadata.tsv", name));
        prefixed.is_file().then_some(prefixed)
    }

    /// Load the metadata of a sample directory, `Ok(None)` when there is none
    pub fn load(sample_dir: &Path) -> Result<Option<Self>, MetadataError> {
        match Self::locate(sample_dir) {
            Some(path) => match Self::from_tsv_file(&path) {
                Ok(metadata) => Ok(Some(metadata)),
                Err(MetadataError::Unreadable { source, .. }) if source.kind() == ErrorKind::NotFound => {
                    Ok(None)
                }
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    /// Parse sample metadata from a TSV file
    pub fn from_tsv_file<P: AsRef<Path>>(path: P) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MetadataError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Parse sample metadata from a reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, MetadataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|s| s.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        if !headers.iter().any(|h| h == "sample_id") {
            return Err(MetadataError::NoSampleIdColumn);
        }

        let record = match csv_reader.records().next() {
            Some(record) => record?,
            None => return Err(MetadataError::NoRecord),
        };

        let mut metadata = SampleMetadata::default();
        for (header, value) in headers.iter().zip(record.iter()) {
            let value = value.trim();
            if is_missing(value) {
                continue;
            }

            match header.as_str() {
                "sample_id" => metadata.sample_id = Some(value.to_string()),
                "massive_id" => metadata.massive_id = Some(value.to_string()),
                _ => {
                    metadata
                        .attributes
                        .insert(header.clone(), value.to_string());
                }
            }
        }

        Ok(metadata)
    }

    /// Bind the metadata to an ionization mode
    pub fn to_sample(&self, ionization_mode: IonizationMode) -> Result<Sample, IdentifierError> {
        let sample_id = self
            .sample_id
            .clone()
            .ok_or(IdentifierError::MissingSampleId)?;
        Sample::new(sample_id, self.massive_id.clone(), ionization_mode)
    }
}
