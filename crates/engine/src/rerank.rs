//! Greedy diversity re-ranking.
//!
//! ## Algorithm
//!
//! Maximal-marginal-relevance style selection over a scored candidate
//! pool. The highest-scored candidate seeds the output; each subsequent
//! slot goes to the remaining candidate maximizing
//!
//! ```text
//! relevance_weight * score + diversity_weight * diversity_if_added
//! ```
//!
//! where `diversity_if_added` is the intra-list genre diversity of the
//! selection with that candidate appended. Ties keep the earlier (higher
//! ranked) candidate.

use std::collections::{HashMap, HashSet};

use catalog::{Genre, MovieCatalog, MovieId};

use crate::combiner::ScoredMovie;

/// Re-orders a scored candidate pool to balance relevance and genre
/// diversity.
pub struct DiversityReranker {
    genre_sets: HashMap<MovieId, HashSet<Genre>>,
    relevance_weight: f32,
    diversity_weight: f32,
}

impl DiversityReranker {
    pub fn new(catalog: &MovieCatalog, relevance_weight: f32, diversity_weight: f32) -> Self {
        let genre_sets = catalog
            .iter()
            .map(|movie| (movie.id, movie.genres.iter().copied().collect()))
            .collect();
        Self {
            genre_sets,
            relevance_weight,
            diversity_weight,
        }
    }

    /// Greedily select up to `k` movies from the scored pool.
    ///
    /// The pool is expected sorted by score descending; if it holds `k`
    /// or fewer candidates it is returned unchanged.
    pub fn rerank(&self, pool: Vec<ScoredMovie>, k: usize) -> Vec<ScoredMovie> {
        if pool.len() <= k {
            return pool;
        }

        let mut remaining = pool;
        let mut selected = vec![remaining.remove(0)];

        while selected.len() < k && !remaining.is_empty() {
            let selected_ids: Vec<MovieId> =
                selected.iter().map(|s| s.movie_id).collect();

            let mut best_index = 0;
            let mut best_combined = f32::NEG_INFINITY;
            for (index, candidate) in remaining.iter().enumerate() {
                let mut tentative = selected_ids.clone();
                tentative.push(candidate.movie_id);
                let diversity = self.intra_list_diversity(&tentative);
                let combined = self.relevance_weight * candidate.score
                    + self.diversity_weight * diversity;
                // Strict comparison keeps the earlier candidate on ties.
                if combined > best_combined {
                    best_combined = combined;
                    best_index = index;
                }
            }
            selected.push(remaining.remove(best_index));
        }

        selected
    }

    /// Mean pairwise genre dissimilarity of a movie list.
    ///
    /// One minus the average Jaccard similarity over all pairs whose
    /// genres are known. Lists with fewer than two such movies score 0.
    pub fn intra_list_diversity(&self, movies: &[MovieId]) -> f32 {
        let mut total_similarity = 0.0;
        let mut pairs = 0u32;
        for (i, a) in movies.iter().enumerate() {
            for b in &movies[i + 1..] {
                let (Some(genres_a), Some(genres_b)) =
                    (self.genre_sets.get(a), self.genre_sets.get(b))
                else {
                    continue;
                };
                total_similarity += jaccard(genres_a, genres_b);
                pairs += 1;
            }
        }
        if pairs == 0 {
            return 0.0;
        }
        1.0 - total_similarity / pairs as f32
    }
}

/// Jaccard similarity between two genre sets; empty union scores 0.
fn jaccard(a: &HashSet<Genre>, b: &HashSet<Genre>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f32 / union as f32
}

// ============================================================================
// Tests
// ============================================================================
