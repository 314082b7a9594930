use std::path::PathBuf;

use crate::identifiers::IdentifierError;
use crate::table::TableError;

/// Errors raised while turning an annotation source into a graph fragment
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Input file of the source is absent for this sample
    #[error("Missing input: {0}")]
    MissingInput(PathBuf),

    /// Input table lacks columns the builder cannot do without
    #[error("Missing required columns in {path}: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// A row whose key field is absent or unparsable
    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// Dominant adduct polarity could not be inferred
    #[error("Cannot infer polarity for {sample}: {detail}")]
    AmbiguousPolarity { sample: String, detail: String },

    /// Writing the fragment failed
    #[error("Failed to write {path}: {source}")]
    SerializeFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Identifier derivation failed
    #[error("Identifier derivation failed: {0}")]
    Identifier(#[from] IdentifierError),

    /// Table could not be read
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// GraphML parsing error
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Non UTF-8 attribute value
    #[error("Invalid UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Structurally invalid GraphML
    #[error("Invalid GraphML: {0}")]
    InvalidGraphml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BuildError {
    /// Whether the error only skips the current source for this sample.
    ///
    /// Anything else aborts the sample's builder task.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BuildError::MissingInput(_)
                | BuildError::MissingColumns { .. }
                | BuildError::MalformedRow { .. }
                | BuildError::Table(_)
                | BuildError::XmlError(_)
                | BuildError::Utf8Error(_)
                | BuildError::InvalidGraphml(_)
        )
    }
}
