//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while loading and validating catalog data.
///
/// Unknown users or movies at query time are never errors anywhere in this
/// workspace; they resolve to documented fallback values. This enum covers
/// load-time failures only, which are fatal to the caller.
#[derive(Error, Debug)]
pub enum CatalogError {
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

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The movie catalog was empty after loading
    #[error("Catalog is empty: {0}")]
    EmptyCatalog(String),

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
