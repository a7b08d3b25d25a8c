//! Novelty signal: inverse popularity, rewarding long-tail discovery.

use crate::error::{Result, SignalError};
use catalog::{MovieId, Rating};
use std::collections::HashMap;
use tracing::debug;

/// Default exponent shaping the novelty curve.
///
/// Values below 1 compress mid-popularity movies toward 1.0; values above 1
/// would reward only the truly obscure.
pub const DEFAULT_NOVELTY_ALPHA: f32 = 0.3;

/// Fitted popularity counts. Read-only after fit.
#[derive(Debug)]
pub struct NoveltyIndex {
    counts: HashMap<MovieId, u32>,
    max_count: u32,
    alpha: f32,
}

impl NoveltyIndex {
    /// Count rating events per movie and record the maximum.
    pub fn fit(ratings: &[Rating], alpha: f32) -> Result<Self> {
        if ratings.is_empty() {
            return Err(SignalError::EmptyRatings {
                component: "NoveltyIndex",
            });
        }

        let mut counts: HashMap<MovieId, u32> = HashMap::new();
        for r in ratings {
            *counts.entry(r.movie_id).or_insert(0) += 1;
        }
        let max_count = counts.values().copied().max().unwrap_or(1);

        debug!(
            movies = counts.len(),
            max_count, "novelty index fitted"
        );

        Ok(Self {
            counts,
            max_count,
            alpha,
        })
    }

    /// Novelty score in [0, 1]; higher means less popular.
    ///
    /// Movies absent from the fit snapshot score 1.0: unseen items get the
    /// benefit of the doubt as maximally novel.
    pub fn score(&self, movie_id: MovieId) -> f32 {
        let Some(&count) = self.counts.get(&movie_id) else {
            return 1.0;
        };
        let inverse = 1.0 - count as f32 / self.max_count as f32;
        inverse.powf(self.alpha)
    }

    /// Rating count for a movie as of fit time.
    pub fn count(&self, movie_id: MovieId) -> u32 {
        self.counts.get(&movie_id).copied().unwrap_or(0)
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }
}
