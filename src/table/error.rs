/// Errors that can occur while reading a table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error reading the table file
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV/TSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),
}

/// A row that cannot be turned into triples
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    /// A required field has no value
    #[error("line {line}: required field '{field}' is missing")]
    MissingField {
        /// 1-based line number
        line: usize,
        /// Column name
        field: String,
    },

    /// A required field cannot be interpreted
    #[error("line {line}: field '{field}' has invalid value '{value}'")]
    InvalidField {
        /// 1-based line number
        line: usize,
        /// Column name
        field: String,
        /// Offending value
        value: String,
    },
}
