use std::path::PathBuf;

use crate::builders::BuildError;
use crate::export::ExportError;
use crate::identifiers::IdentifierError;
use crate::merge::MergeError;
use crate::metadata::MetadataError;

/// Errors that abort a run or one sample task of a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The data root does not exist or is not a directory
    #[error("Data root not found: {0}")]
    RootNotFound(PathBuf),

    /// I/O error while discovering samples
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The worker pool could not be created
    #[error("Worker pool: {0}")]
    ThreadPool(String),

    /// A sample directory has no metadata table
    #[error("No sample metadata in {0}")]
    MissingMetadata(PathBuf),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
