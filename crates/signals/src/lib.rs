//! # Signals Crate
//!
//! The four independent per-candidate signal sources consumed by the hybrid
//! engine.
//!
//! ## Components
//!
//! ### SimilarityIndex (collaborative filtering)
//! User-user cosine similarity over the rating matrix; predicts a 0-5 rating
//! from the k most similar users who rated the candidate.
//!
//! ### ContentIndex
//! TF-IDF features over genre/tag text with an item-item cosine matrix;
//! predicts 0-1 affinity as mean similarity to the user's liked movies.
//!
//! ### LatentFactors
//! Opaque pre-trained factorized predictor (embeddings + biases) on the
//! 0.5-5.0 scale; loaded from an artifact, never trained here.
//!
//! ### NoveltyIndex
//! Inverse-popularity score in 0-1, rewarding long-tail discovery.
//!
//! All indices are built once from a frozen rating/catalog snapshot and are
//! immutable afterwards, so they can be shared across concurrent scoring
//! requests without synchronization.

// Public modules
pub mod content;
pub mod error;
pub mod latent;
pub mod novelty;
pub mod similarity;

// Re-export commonly used types
pub use content::{ContentIndex, DEFAULT_MAX_FEATURES};
pub use error::{Result, SignalError};
pub use latent::LatentFactors;
pub use novelty::{DEFAULT_NOVELTY_ALPHA, NoveltyIndex};
pub use similarity::{DEFAULT_K_NEIGHBORS, SimilarityIndex};
