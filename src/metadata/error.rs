use std::path::PathBuf;

/// Why a sample's metadata or the adduct table could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// File exists but cannot be opened or read
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Record that the TSV reader rejects
    #[error("Malformed metadata table: {0}")]
    Malformed(#[from] csv::Error),

    /// Header without a `sample_id` column
    #[error("Metadata table has no sample_id column")]
    NoSampleIdColumn,

    /// Header only
    #[error("Metadata table has no data row")]
    NoRecord,

    /// Adduct table that is not a flat JSON object of strings
    #[error("Invalid adduct table: {0}")]
    InvalidAdducts(#[from] serde_json::Error),
}
