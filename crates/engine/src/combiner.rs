//! Hybrid score combination.
//!
//! ## Algorithm
//!
//! Each candidate movie receives four signal scores, normalized into
//! `[0, 1]`, then blended with the configured [`HybridWeights`]:
//!
//! 1. Collaborative filtering: predicted rating divided by the rating
//!    ceiling, with zero predictions passed through untouched
//! 2. Content: profile similarity against the user's liked movies
//! 3. Latent factors: bias-plus-factor prediction divided by the ceiling
//! 4. Novelty: inverse-popularity score, already in `[0, 1]`
//!
//! Ranking a candidate set scores every movie in parallel and sorts by
//! final score descending.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use catalog::{LIKED_THRESHOLD, MAX_RATING, MovieId, RatingLog, UserId};
use signals::{ContentIndex, LatentFactors, NoveltyIndex, SimilarityIndex};

use crate::config::HybridWeights;

// ============================================================================
// ScoreBreakdown
// ============================================================================

/// Per-signal decomposition of a final score.
///
/// Signal scores are the normalized values that entered the blend, so
/// `final_score` equals the weighted sum of the four `*_score` fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub cf_score: f32,
    pub cf_weight: f32,
    pub content_score: f32,
    pub content_weight: f32,
    pub latent_score: f32,
    pub latent_weight: f32,
    pub novelty_score: f32,
    pub novelty_weight: f32,
    pub final_score: f32,
}

impl ScoreBreakdown {
    /// Breakdown attached to cold-start picks: no personalization signal
    /// is available, so the score is attributed entirely to novelty.
    pub fn cold_start(final_score: f32) -> Self {
        Self {
            cf_score: 0.0,
            cf_weight: 0.0,
            content_score: 0.0,
            content_weight: 0.0,
            latent_score: 0.0,
            latent_weight: 0.0,
            novelty_score: 1.0,
            novelty_weight: 1.0,
            final_score,
        }
    }
}

/// A candidate movie with its blended score.
#[derive(Debug, Clone)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f32,
    pub breakdown: Option<ScoreBreakdown>,
}

// ============================================================================
// HybridCombiner
// ============================================================================

/// Blends the four signal components into a single ranking score.
pub struct HybridCombiner {
    similarity: Arc<SimilarityIndex>,
    content: Arc<ContentIndex>,
    latent: Arc<LatentFactors>,
    novelty: Arc<NoveltyIndex>,
    log: Arc<RatingLog>,
    weights: HybridWeights,
}

impl HybridCombiner {
    pub fn new(
        similarity: Arc<SimilarityIndex>,
        content: Arc<ContentIndex>,
        latent: Arc<LatentFactors>,
        novelty: Arc<NoveltyIndex>,
        log: Arc<RatingLog>,
        weights: HybridWeights,
    ) -> Self {
        Self {
            similarity,
            content,
            latent,
            novelty,
            log,
            weights,
        }
    }

    /// Score a single (user, movie) pair.
    ///
    /// When `explain` is true the per-signal breakdown is returned
    /// alongside the blended score.
    pub fn score(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        explain: bool,
    ) -> (f32, Option<ScoreBreakdown>) {
        let liked = self.log.liked_movies(user_id, LIKED_THRESHOLD);
        self.score_with_liked(user_id, movie_id, &liked, explain)
    }

    /// Score a candidate set and sort it by final score, descending.
    ///
    /// The sort is stable, so equal scores keep candidate-list order.
    pub fn rank(
        &self,
        user_id: UserId,
        candidates: &[MovieId],
        explain: bool,
    ) -> Vec<ScoredMovie> {
        // Liked-set lookup walks the rating log; hoist it out of the
        // per-candidate loop.
        let liked = self.log.liked_movies(user_id, LIKED_THRESHOLD);

        let mut scored: Vec<ScoredMovie> = candidates
            .par_iter()
            .map(|&movie_id| {
                let (score, breakdown) =
                    self.score_with_liked(user_id, movie_id, &liked, explain);
                ScoredMovie {
                    movie_id,
                    score,
                    breakdown,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!(
            user_id,
            candidates = candidates.len(),
            "ranked candidate set"
        );
        scored
    }

    pub fn weights(&self) -> &HybridWeights {
        &self.weights
    }

    fn score_with_liked(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        liked: &[MovieId],
        explain: bool,
    ) -> (f32, Option<ScoreBreakdown>) {
        let cf_raw = self.similarity.predict(user_id, movie_id);
        let cf = if cf_raw > 0.0 { cf_raw / MAX_RATING } else { 0.0 };

        let content = self.content.predict_from_liked(movie_id, liked);

        // Latent predictions are clamped to the rating range, so the
        // normalized value stays in (0, 1].
        let latent = self.latent.predict(user_id, movie_id) / MAX_RATING;

        let novelty = self.novelty.score(movie_id);

        let final_score = self.weights.blend(cf, content, latent, novelty);

        let breakdown = explain.then(|| ScoreBreakdown {
            cf_score: cf,
            cf_weight: self.weights.cf,
            content_score: content,
            content_weight: self.weights.content,
            latent_score: latent,
            latent_weight: self.weights.latent,
            novelty_score: novelty,
            novelty_weight: self.weights.novelty,
            final_score,
        });

        (final_score, breakdown)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Rating;

    fn fixture() -> (HybridCombiner, Arc<RatingLog>) {
        let ratings = vec![
            Rating::new(1, 10, 5.0, 100).unwrap(),
            Rating::new(1, 20, 1.0, 101).unwrap(),
            Rating::new(2, 10, 4.0, 102).unwrap(),
            Rating::new(2, 20, 5.0, 103).unwrap(),
            Rating::new(3, 10, 1.0, 104).unwrap(),
            Rating::new(3, 20, 5.0, 105).unwrap(),
        ];
        let log = Arc::new(RatingLog::new(ratings.clone()));

        let similarity = Arc::new(SimilarityIndex::fit(&ratings, 1).unwrap());
        let docs = vec![
            (10, "action adventure".to_string()),
            (20, "romance drama".to_string()),
            (30, "action thriller".to_string()),
        ];
        let content = Arc::new(ContentIndex::fit(&docs, 500).unwrap());
        let novelty = Arc::new(NoveltyIndex::fit(&ratings, 0.3).unwrap());
        let latent = Arc::new(LatentFactors::bias_baseline(&ratings));

        let combiner = HybridCombiner::new(
            similarity,
            content,
            latent,
            novelty,
            Arc::clone(&log),
            HybridWeights::default(),
        );
        (combiner, log)
    }

    #[test]
    fn test_score_in_unit_range() {
        let (combiner, _) = fixture();
        for movie in [10, 20, 30] {
            let (score, _) = combiner.score(1, movie, false);
            assert!((0.0..=1.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn test_breakdown_only_when_requested() {
        let (combiner, _) = fixture();
        let (_, none) = combiner.score(1, 10, false);
        assert!(none.is_none());
        let (_, some) = combiner.score(1, 10, true);
        assert!(some.is_some());
    }

    #[test]
    fn test_breakdown_sums_to_final_score() {
        let (combiner, _) = fixture();
        let (score, breakdown) = combiner.score(1, 30, true);
        let b = breakdown.unwrap();
        let recombined = b.cf_score * b.cf_weight
            + b.content_score * b.content_weight
            + b.latent_score * b.latent_weight
            + b.novelty_score * b.novelty_weight;
        assert!((recombined - score).abs() < 1e-6);
        assert_eq!(b.final_score, score);
    }

    #[test]
    fn test_rank_descending() {
        let (combiner, _) = fixture();
        let ranked = combiner.rank(1, &[10, 20, 30], false);
        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_unknown_movie_still_scored() {
        // A movie absent from every index gets zero CF/content and full
        // novelty, never a panic.
        let (combiner, _) = fixture();
        let (score, breakdown) = combiner.score(1, 999, true);
        let b = breakdown.unwrap();
        assert_eq!(b.cf_score, 0.0);
        assert_eq!(b.content_score, 0.0);
        assert_eq!(b.novelty_score, 1.0);
        assert!(score > 0.0);
    }

    #[test]
    fn test_liked_set_reads_live_log() {
        let (combiner, log) = fixture();
        let (before, _) = combiner.score(4, 30, false);
        // User 4 appears and loves an action movie; the content signal
        // for the action candidate should move.
        log.append(Rating::new(4, 10, 5.0, 200).unwrap());
        let (after, _) = combiner.score(4, 30, false);
        assert!(after > before);
    }
}
