//! Error types for the recommendation engine.

use thiserror::Error;

/// Errors that can occur while configuring or running the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation that requires fitted indices was called before `fit`.
    #[error("engine is not fitted yet; call fit() with catalog and rating data first")]
    NotFitted,

    /// A blend weight was outside the accepted range.
    #[error("invalid weight for '{name}': {value} (weights must be non-negative)")]
    InvalidWeight { name: &'static str, value: f32 },

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file was not valid JSON.
    #[error("malformed configuration: {0}")]
    MalformedConfig(#[from] serde_json::Error),

    /// Error propagated from the catalog layer.
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    /// Error propagated from a signal component.
    #[error(transparent)]
    Signal(#[from] signals::SignalError),
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
