//! Error types for Strata.

use thiserror::Error;

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;

/// Errors that can occur in Strata storage operations.
#[derive(Debug, Error)]
pub enum StrataError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Codec errors
    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Value {value} does not fit in {type_name}")]
    Overflow { type_name: String, value: String },

    #[error("Invalid {type_name} literal: {literal:?}")]
    InvalidLiteral { type_name: String, literal: String },

    #[error("Malformed file: {0}")]
    MalformedFile(String),

    // Record and page errors
    #[error("Column index {index} out of range for {len} columns")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Duplicate row id: {0}")]
    DuplicateKey(u32),

    #[error("Page full: {size} bytes exceeds capacity {capacity}")]
    PageFull { size: usize, capacity: usize },

    // B-tree errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("B-tree corrupted: {0}")]
    BTreeCorrupted(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}

impl StrataError {
    /// Shorthand for a `MalformedFile` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        StrataError::MalformedFile(reason.into())
    }

    /// Returns true for errors reporting the absence of an expected entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::NotFound(_))
    }
}
