//! Latent factor model: an opaque, offline-trained factorized rating
//! predictor.
//!
//! The engine never trains this model. It is produced elsewhere (any
//! SGD-trained low-rank factorization with bias terms satisfies the
//! contract) and loaded here from a serialized artifact. Prediction is
//! `clamp(mean + b_u + b_i + p_u . q_i, 0.5, 5.0)`; terms missing for an
//! unknown user or movie simply contribute nothing, matching the usual
//! fall-back-to-baseline behavior of such models.

use crate::error::Result;
use catalog::{MAX_RATING, MIN_RATING, MovieId, Rating, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Pre-trained factorized predictor with bias terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatentFactors {
    pub global_mean: f32,
    #[serde(default)]
    pub user_bias: HashMap<UserId, f32>,
    #[serde(default)]
    pub movie_bias: HashMap<MovieId, f32>,
    #[serde(default)]
    pub user_factors: HashMap<UserId, Vec<f32>>,
    #[serde(default)]
    pub movie_factors: HashMap<MovieId, Vec<f32>>,
}

impl LatentFactors {
    /// Load a pre-trained artifact from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let model: Self = serde_json::from_reader(BufReader::new(file))?;
        info!(
            users = model.user_bias.len(),
            movies = model.movie_bias.len(),
            "loaded latent factor model"
        );
        Ok(model)
    }

    /// Bias-only stand-in built from a rating snapshot: global mean plus
    /// mean-centered user and movie offsets, no factor vectors.
    ///
    /// This exists so the engine can serve without a trained artifact; it is
    /// a loader fallback, not a training procedure.
    pub fn bias_baseline(ratings: &[Rating]) -> Self {
        if ratings.is_empty() {
            return Self {
                global_mean: 0.0,
                user_bias: HashMap::new(),
                movie_bias: HashMap::new(),
                user_factors: HashMap::new(),
                movie_factors: HashMap::new(),
            };
        }

        let global_mean =
            ratings.iter().map(|r| r.value).sum::<f32>() / ratings.len() as f32;

        let mut user_sums: HashMap<UserId, (f32, u32)> = HashMap::new();
        let mut movie_sums: HashMap<MovieId, (f32, u32)> = HashMap::new();
        for r in ratings {
            let u = user_sums.entry(r.user_id).or_insert((0.0, 0));
            u.0 += r.value - global_mean;
            u.1 += 1;
            let m = movie_sums.entry(r.movie_id).or_insert((0.0, 0));
            m.0 += r.value - global_mean;
            m.1 += 1;
        }

        Self {
            global_mean,
            user_bias: user_sums
                .into_iter()
                .map(|(id, (sum, n))| (id, sum / n as f32))
                .collect(),
            movie_bias: movie_sums
                .into_iter()
                .map(|(id, (sum, n))| (id, sum / n as f32))
                .collect(),
            user_factors: HashMap::new(),
            movie_factors: HashMap::new(),
        }
    }

    /// Predicted rating on the [0.5, 5.0] scale.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let mut estimate = self.global_mean;
        if let Some(b) = self.user_bias.get(&user_id) {
            estimate += b;
        }
        if let Some(b) = self.movie_bias.get(&movie_id) {
            estimate += b;
        }
        if let (Some(p), Some(q)) = (
            self.user_factors.get(&user_id),
            self.movie_factors.get(&movie_id),
        ) {
            estimate += p.iter().zip(q).map(|(a, b)| a * b).sum::<f32>();
        }
        estimate.clamp(MIN_RATING, MAX_RATING)
    }

    /// Predict ratings for several movies at once.
    pub fn predict_batch(&self, user_id: UserId, movie_ids: &[MovieId]) -> HashMap<MovieId, f32> {
        movie_ids
            .iter()
            .map(|&m| (m, self.predict(user_id, m)))
            .collect()
    }
}
