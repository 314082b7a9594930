/// Errors raised while reading or writing graphs
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed Turtle input
    #[error("Turtle parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Prefixed name whose prefix was never declared
    #[error("Undefined prefix '{prefix}' at line {line}")]
    UndefinedPrefix { line: usize, prefix: String },

    /// Input is not valid UTF-8
    #[error("Invalid UTF-8 in graph file: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}
