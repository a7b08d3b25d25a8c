//! Error types for signal fitting and model loading.

use thiserror::Error;

/// Fit-time and load-time failures of the signal components.
///
/// Query-time "unknown entity" conditions are not represented here; every
/// signal resolves those to a documented fallback value instead of failing.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Fitting was attempted on an empty rating log
    #[error("Cannot fit {component} on an empty rating log")]
    EmptyRatings { component: &'static str },

    /// Fitting was attempted on an empty document/item set
    #[error("Cannot fit {component} on an empty item set")]
    EmptyItems { component: &'static str },

    /// A pre-trained model artifact could not be read
    #[error("I/O error loading model: {0}")]
    IoError(#[from] std::io::Error),

    /// A pre-trained model artifact could not be decoded
    #[error("Malformed model artifact: {0}")]
    MalformedArtifact(#[from] serde_json::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SignalError>;
