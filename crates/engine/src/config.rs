//! Engine configuration.
//!
//! ## Components
//!
//! - [`HybridWeights`]: blend coefficients for the four scoring signals
//! - [`EngineConfig`]: full tuning surface for a recommender instance
//!
//! Both deserialize from JSON with `#[serde(default)]`, so a config file
//! only needs to list the fields it overrides.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ============================================================================
// Defaults
// ============================================================================

/// Default weight for the collaborative-filtering signal.
pub const DEFAULT_CF_WEIGHT: f32 = 0.25;
/// Default weight for the content-similarity signal.
pub const DEFAULT_CONTENT_WEIGHT: f32 = 0.25;
/// Default weight for the latent-factor signal.
pub const DEFAULT_LATENT_WEIGHT: f32 = 0.35;
/// Default weight for the novelty signal.
pub const DEFAULT_NOVELTY_WEIGHT: f32 = 0.15;

/// Default relevance weight used during diversity re-ranking.
pub const DEFAULT_RELEVANCE_WEIGHT: f32 = 0.7;
/// Default diversity weight used during diversity re-ranking.
pub const DEFAULT_DIVERSITY_WEIGHT: f32 = 0.3;

// ============================================================================
// HybridWeights
// ============================================================================

/// Blend coefficients applied to the four normalized signal scores.
///
/// Weights are not required to sum to 1.0, but each must be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub cf: f32,
    pub content: f32,
    pub latent: f32,
    pub novelty: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            cf: DEFAULT_CF_WEIGHT,
            content: DEFAULT_CONTENT_WEIGHT,
            latent: DEFAULT_LATENT_WEIGHT,
            novelty: DEFAULT_NOVELTY_WEIGHT,
        }
    }
}

impl HybridWeights {
    /// Create a validated set of weights.
    pub fn new(cf: f32, content: f32, latent: f32, novelty: f32) -> Result<Self> {
        let weights = Self {
            cf,
            content,
            latent,
            novelty,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Check every weight is non-negative and finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cf", self.cf),
            ("content", self.content),
            ("latent", self.latent),
            ("novelty", self.novelty),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }

    /// Weighted sum of the four normalized signal scores.
    pub fn blend(&self, cf: f32, content: f32, latent: f32, novelty: f32) -> f32 {
        self.cf * cf + self.content * content + self.latent * latent + self.novelty * novelty
    }
}

// ============================================================================
// EngineConfig
// ============================================================================

/// Tuning parameters for a recommender instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Signal blend weights.
    pub weights: HybridWeights,
    /// Neighborhood size for collaborative filtering.
    pub k_neighbors: usize,
    /// Vocabulary cap for the content index.
    pub max_features: usize,
    /// Exponent compressing the novelty curve.
    pub novelty_alpha: f32,
    /// Relevance weight during diversity re-ranking.
    pub relevance_weight: f32,
    /// Diversity weight during diversity re-ranking.
    pub diversity_weight: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: HybridWeights::default(),
            k_neighbors: signals::DEFAULT_K_NEIGHBORS,
            max_features: signals::DEFAULT_MAX_FEATURES,
            novelty_alpha: signals::DEFAULT_NOVELTY_ALPHA,
            relevance_weight: DEFAULT_RELEVANCE_WEIGHT,
            diversity_weight: DEFAULT_DIVERSITY_WEIGHT,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file, validating the weights.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.weights.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
