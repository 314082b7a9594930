use std::path::PathBuf;

use crate::identifiers::IdentifierError;
use crate::metadata::MetadataError;

/// Errors that can occur while merging a sample's fragments
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// I/O error while enumerating or removing files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Sample metadata could not be read
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Sample metadata lacks the fields needed to name the artifact
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// The merged artifact could not be written to its final path
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provenance sidecar could not be read or written
    #[error("Provenance file {path}: {source}")]
    Provenance {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
