//! Error types for the data-loader crate.
//!
//! Every variant here is a load-time or data-precondition failure. They are
//! surfaced to the caller instead of being papered over with defaults, so a
//! malformed roster never turns into a silently wrong result.

use thiserror::Error;

/// Errors that can occur while loading, deriving or encoding the roster
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// The header row does not name a required column
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// A categorical value was not part of the vocabulary seen at load time
    #[error("Unknown {field} value: '{value}'")]
    UnknownCategory { field: String, value: String },

    /// A categorical code lies outside `[0, k)` for its field
    #[error("Unknown {field} code: {code}")]
    UnknownCode { field: String, code: u32 },

    /// The classifier returned a different number of labels than records
    #[error("Expected {expected} engagement labels but got {found}")]
    LabelCountMismatch { expected: usize, found: usize },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
