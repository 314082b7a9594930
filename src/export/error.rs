use std::path::PathBuf;

use crate::merge::MergeError;

/// Errors that can occur while exporting merged graphs
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error on the target directory or a sample artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The exported file could not be written to its final path
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sample's merge artifacts or provenance could not be read
    #[error("Merge artifact error: {0}")]
    Merge(#[from] MergeError),
}
