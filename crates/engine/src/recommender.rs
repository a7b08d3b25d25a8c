//! Top-N recommendation orchestration.
//!
//! ## Pipeline
//!
//! 1. Cold-start check: users absent from the rating log get a
//!    popularity list instead of personalized scores
//! 2. Candidate selection: the full catalog, minus already-rated
//!    movies when exclusion is on
//! 3. Hybrid scoring and ranking via [`HybridCombiner`]
//! 4. Optional diversity re-ranking over the top `2n` pool
//! 5. Metadata attachment from the catalog

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use catalog::{Genre, MovieCatalog, MovieId, RatingLog, UserId};
use signals::{ContentIndex, LatentFactors, NoveltyIndex, SimilarityIndex};

use crate::combiner::{HybridCombiner, ScoreBreakdown, ScoredMovie};
use crate::config::EngineConfig;
use crate::explain::{self, Explanation};
use crate::rerank::DiversityReranker;

// ============================================================================
// Cold-start tuning
// ============================================================================

/// Minimum rating count for a cold-start candidate.
const COLD_START_MIN_COUNT: u32 = 50;
/// Minimum mean rating for a cold-start candidate.
const COLD_START_MIN_MEAN: f32 = 4.0;
/// Fixed score assigned to cold-start picks.
const COLD_START_SCORE: f32 = 0.8;
/// The first few cold-start slots skip the new-genre requirement.
const COLD_START_UNCONSTRAINED: usize = 3;

/// Diversity re-ranking draws from a pool this many times the list size.
const DIVERSIFY_POOL_FACTOR: usize = 2;

// ============================================================================
// Request/response types
// ============================================================================

/// Knobs for a single recommendation request.
#[derive(Debug, Clone, Copy)]
pub struct RecommendOptions {
    /// Drop movies the user has already rated.
    pub exclude_rated: bool,
    /// Apply greedy genre-diversity re-ranking.
    pub diversify: bool,
    /// Attach per-signal score breakdowns.
    pub explain: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            exclude_rated: true,
            diversify: true,
            explain: false,
        }
    }
}

/// A recommended movie with catalog metadata attached.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<Genre>,
    pub year: Option<u16>,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Aggregate rating stats for one movie, used by the cold-start path.
#[derive(Debug, Clone, Copy)]
struct PopularMovie {
    movie_id: MovieId,
    count: u32,
    mean: f32,
}

// ============================================================================
// Recommender
// ============================================================================

/// Fitted recommendation pipeline over a catalog and rating log.
pub struct Recommender {
    catalog: Arc<MovieCatalog>,
    log: Arc<RatingLog>,
    content: Arc<ContentIndex>,
    combiner: HybridCombiner,
    reranker: DiversityReranker,
    /// Sorted by rating count descending, movie id ascending.
    popularity: Vec<PopularMovie>,
}

impl Recommender {
    pub fn new(
        catalog: Arc<MovieCatalog>,
        log: Arc<RatingLog>,
        similarity: Arc<SimilarityIndex>,
        content: Arc<ContentIndex>,
        latent: Arc<LatentFactors>,
        novelty: Arc<NoveltyIndex>,
        config: &EngineConfig,
    ) -> Self {
        let combiner = HybridCombiner::new(
            similarity,
            Arc::clone(&content),
            latent,
            novelty,
            Arc::clone(&log),
            config.weights,
        );
        let reranker = DiversityReranker::new(
            &catalog,
            config.relevance_weight,
            config.diversity_weight,
        );
        let popularity = popularity_table(&log);

        Self {
            catalog,
            log,
            content,
            combiner,
            reranker,
            popularity,
        }
    }

    /// Generate up to `n` recommendations for a user.
    #[instrument(skip(self))]
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
        options: RecommendOptions,
    ) -> Vec<Recommendation> {
        if !self.log.knows_user(user_id) {
            warn!(user_id, "unknown user, falling back to cold-start list");
            return self.cold_start(n, options.explain);
        }

        // Exclusion reads the live log so ratings appended after fitting
        // drop out of the candidate set immediately.
        let rated: HashSet<MovieId> = if options.exclude_rated {
            self.log.rated_movies(user_id)
        } else {
            HashSet::new()
        };
        let candidates: Vec<MovieId> = self
            .catalog
            .ids()
            .iter()
            .copied()
            .filter(|id| !rated.contains(id))
            .collect();

        let mut scored = self.combiner.rank(user_id, &candidates, options.explain);

        if options.diversify {
            scored.truncate(n * DIVERSIFY_POOL_FACTOR);
            let pool: Vec<ScoredMovie> = scored.clone();
            let selected: HashSet<MovieId> = self
                .reranker
                .rerank(pool, n)
                .into_iter()
                .map(|s| s.movie_id)
                .collect();
            // Keep score order among the selected movies.
            scored.retain(|s| selected.contains(&s.movie_id));
        }

        scored.truncate(n);
        let recommendations: Vec<Recommendation> = scored
            .into_iter()
            .filter_map(|s| {
                let movie = self.catalog.get(s.movie_id)?;
                Some(Recommendation {
                    movie_id: s.movie_id,
                    title: movie.title.clone(),
                    genres: movie.genres.clone(),
                    year: movie.year,
                    score: s.score,
                    breakdown: s.breakdown,
                })
            })
            .collect();

        debug!(
            user_id,
            returned = recommendations.len(),
            "recommendation list built"
        );
        recommendations
    }

    /// Score one movie for a user and explain the result.
    ///
    /// Returns `None` when the movie is not in the catalog.
    pub fn explain_movie(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Option<(Recommendation, Explanation)> {
        let movie = self.catalog.get(movie_id)?;
        let (score, breakdown) = self.combiner.score(user_id, movie_id, true);
        let breakdown = breakdown?;
        let explanation = explain::explain(&breakdown);
        let recommendation = Recommendation {
            movie_id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            year: movie.year,
            score,
            breakdown: Some(breakdown),
        };
        Some((recommendation, explanation))
    }

    /// Popularity fallback for users with no rating history.
    ///
    /// Walks movies by rating count descending, keeping those with at
    /// least [`COLD_START_MIN_COUNT`] ratings averaging
    /// [`COLD_START_MIN_MEAN`] or better. After the first
    /// [`COLD_START_UNCONSTRAINED`] picks, a movie must introduce at
    /// least one unseen genre to earn a slot.
    fn cold_start(&self, n: usize, explain: bool) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        let mut seen_genres: HashSet<Genre> = HashSet::new();

        for popular in &self.popularity {
            if recommendations.len() >= n {
                break;
            }
            if popular.count < COLD_START_MIN_COUNT || popular.mean < COLD_START_MIN_MEAN {
                continue;
            }
            let Some(movie) = self.catalog.get(popular.movie_id) else {
                continue;
            };

            let genres: HashSet<Genre> = movie.genres.iter().copied().collect();
            let introduces_new_genre = !genres.is_subset(&seen_genres);
            if introduces_new_genre || recommendations.len() < COLD_START_UNCONSTRAINED {
                recommendations.push(Recommendation {
                    movie_id: movie.id,
                    title: movie.title.clone(),
                    genres: movie.genres.clone(),
                    year: movie.year,
                    score: COLD_START_SCORE,
                    breakdown: explain.then(|| ScoreBreakdown::cold_start(COLD_START_SCORE)),
                });
                seen_genres.extend(genres);
            }
        }

        info!(
            returned = recommendations.len(),
            "cold-start list from popularity"
        );
        recommendations
    }

    // Accessors used by the service layer.

    pub fn catalog(&self) -> &MovieCatalog {
        &self.catalog
    }

    pub fn log(&self) -> &RatingLog {
        &self.log
    }

    pub fn content(&self) -> &ContentIndex {
        &self.content
    }

    pub fn combiner(&self) -> &HybridCombiner {
        &self.combiner
    }
}

/// Aggregate the rating log into per-movie counts and means.
fn popularity_table(log: &RatingLog) -> Vec<PopularMovie> {
    let mut sums: HashMap<MovieId, (f32, u32)> = HashMap::new();
    for rating in log.snapshot() {
        let entry = sums.entry(rating.movie_id).or_insert((0.0, 0));
        entry.0 += rating.value;
        entry.1 += 1;
    }
    let mut table: Vec<PopularMovie> = sums
        .into_iter()
        .map(|(movie_id, (sum, count))| PopularMovie {
            movie_id,
            count,
            mean: sum / count as f32,
        })
        .collect();
    // Count descending, id ascending for a deterministic order.
    table.sort_by(|a, b| b.count.cmp(&a.count).then(a.movie_id.cmp(&b.movie_id)));
    table
}

// ============================================================================
// Tests
// ============================================================================
