//! User-based collaborative filtering signal.
//!
//! ## Algorithm
//! 1. Pivot the rating log into a dense user×movie matrix (duplicate events
//!    per cell are averaged)
//! 2. Precompute the symmetric user-user cosine similarity matrix
//! 3. `predict` takes a similarity-weighted average of the k most similar
//!    other users' ratings of the target movie
//!
//! Row/column index sets are derived once at fit time and frozen; ratings
//! appended after fit are not visible here until refit.

use crate::error::{Result, SignalError};
use catalog::{MovieId, Rating, UserId};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Default neighborhood size
pub const DEFAULT_K_NEIGHBORS: usize = 30;

/// Fitted user-based CF index.
///
/// Read-only after fit; safe to share across threads behind an `Arc`.
#[derive(Debug)]
pub struct SimilarityIndex {
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    /// id -> row/column position, built once at fit time
    user_pos: HashMap<UserId, usize>,
    movie_pos: HashMap<MovieId, usize>,
    /// Dense user-major rating matrix; 0.0 means unrated
    matrix: Vec<f32>,
    /// Symmetric user-user cosine similarity, row-major
    similarity: Vec<f32>,
    k_neighbors: usize,
}

impl SimilarityIndex {
    /// Fit the index from a rating snapshot.
    ///
    /// Fails on an empty snapshot; every other input shape is accepted.
    pub fn fit(ratings: &[Rating], k_neighbors: usize) -> Result<Self> {
        if ratings.is_empty() {
            return Err(SignalError::EmptyRatings {
                component: "SimilarityIndex",
            });
        }

        // Frozen, sorted index sets
        let user_set: BTreeSet<UserId> = ratings.iter().map(|r| r.user_id).collect();
        let movie_set: BTreeSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
        let user_ids: Vec<UserId> = user_set.into_iter().collect();
        let movie_ids: Vec<MovieId> = movie_set.into_iter().collect();
        let user_pos: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let movie_pos: HashMap<MovieId, usize> =
            movie_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n_users = user_ids.len();
        let n_movies = movie_ids.len();

        // Pivot: duplicate (user, movie) events are averaged
        let mut sums = vec![0.0f32; n_users * n_movies];
        let mut counts = vec![0u32; n_users * n_movies];
        for r in ratings {
            let cell = user_pos[&r.user_id] * n_movies + movie_pos[&r.movie_id];
            sums[cell] += r.value;
            counts[cell] += 1;
        }
        let matrix: Vec<f32> = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f32 } else { 0.0 })
            .collect();

        debug!(n_users, n_movies, "computing user similarity matrix");
        let similarity = cosine_matrix(&matrix, n_users, n_movies);

        Ok(Self {
            user_ids,
            movie_ids,
            user_pos,
            movie_pos,
            matrix,
            similarity,
            k_neighbors,
        })
    }

    /// Predict a rating for a (user, movie) pair on the 0-5 scale.
    ///
    /// Unknown user or movie returns 0.0. So does a neighborhood in which no
    /// neighbor rated the movie (zero denominator): the two cases are
    /// indistinguishable to callers, which downstream scoring preserves.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        let (Some(&u), Some(&m)) = (self.user_pos.get(&user_id), self.movie_pos.get(&movie_id))
        else {
            return 0.0;
        };

        let n_users = self.user_ids.len();
        let n_movies = self.movie_ids.len();
        let sims = &self.similarity[u * n_users..(u + 1) * n_users];

        // Neighbors by similarity descending, self excluded. Ties break on
        // ascending user index, which keeps the ordering deterministic.
        let mut order: Vec<usize> = (0..n_users).filter(|&i| i != u).collect();
        order.sort_by(|&a, &b| {
            sims[b]
                .partial_cmp(&sims[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut numerator = 0.0f32;
        let mut denominator = 0.0f32;
        for &i in order.iter().take(self.k_neighbors) {
            let rating = self.matrix[i * n_movies + m];
            if rating > 0.0 {
                numerator += sims[i] * rating;
                denominator += sims[i];
            }
        }

        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }

    /// Predict scores for several movies at once.
    pub fn predict_batch(&self, user_id: UserId, movie_ids: &[MovieId]) -> HashMap<MovieId, f32> {
        movie_ids
            .iter()
            .map(|&m| (m, self.predict(user_id, m)))
            .collect()
    }

    /// Movies the user had rated as of fit time; empty for unknown users.
    pub fn rated_movies(&self, user_id: UserId) -> HashSet<MovieId> {
        let Some(&u) = self.user_pos.get(&user_id) else {
            return HashSet::new();
        };
        let n_movies = self.movie_ids.len();
        let row = &self.matrix[u * n_movies..(u + 1) * n_movies];
        row.iter()
            .enumerate()
            .filter(|&(_, &v)| v > 0.0)
            .map(|(i, _)| self.movie_ids[i])
            .collect()
    }

    /// (users, movies) covered by the frozen matrix.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.user_ids.len(), self.movie_ids.len())
    }
}

/// Pairwise cosine similarity between the rows of a dense matrix.
///
/// Zero rows get similarity 0.0 against everything, including themselves.
fn cosine_matrix(matrix: &[f32], n_rows: usize, n_cols: usize) -> Vec<f32> {
    let norms: Vec<f32> = (0..n_rows)
        .map(|i| {
            let row = &matrix[i * n_cols..(i + 1) * n_cols];
            row.iter().map(|v| v * v).sum::<f32>().sqrt()
        })
        .collect();

    let mut similarity = vec![0.0f32; n_rows * n_rows];
    similarity
        .par_chunks_mut(n_rows)
        .enumerate()
        .for_each(|(i, out_row)| {
            let row_i = &matrix[i * n_cols..(i + 1) * n_cols];
            for (j, out) in out_row.iter_mut().enumerate() {
                if norms[i] == 0.0 || norms[j] == 0.0 {
                    continue;
                }
                let row_j = &matrix[j * n_cols..(j + 1) * n_cols];
                let dot: f32 = row_i.iter().zip(row_j).map(|(a, b)| a * b).sum();
                *out = dot / (norms[i] * norms[j]);
            }
        });

    similarity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating::new(user_id, movie_id, value, 1_000_000).unwrap()
    }

    /// Three users, two movies. User 1 = (5, 1), user 2 = (4, 5),
    /// user 3 = (1, 5). By cosine similarity user 2 is closer to user 1
    /// (0.766 vs 0.385), so with k=1 the prediction for (1, 20) is user 2's
    /// rating of movie 20.
    fn three_user_fixture() -> Vec<Rating> {
        vec![
            rating(1, 10, 5.0),
            rating(1, 20, 1.0),
            rating(2, 10, 4.0),
            rating(2, 20, 5.0),
            rating(3, 10, 1.0),
            rating(3, 20, 5.0),
        ]
    }

    #[test]
    fn test_fit_rejects_empty_log() {
        assert!(SimilarityIndex::fit(&[], DEFAULT_K_NEIGHBORS).is_err());
    }

    #[test]
    fn test_k1_neighbor_prediction() {
        let index = SimilarityIndex::fit(&three_user_fixture(), 1).unwrap();
        let pred = index.predict(1, 20);
        // Single neighbor (user 2), so the weighted average collapses to
        // that neighbor's rating
        assert!((pred - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_prediction_in_rating_range() {
        let index = SimilarityIndex::fit(&three_user_fixture(), DEFAULT_K_NEIGHBORS).unwrap();
        for &user in &[1, 2, 3] {
            for &movie in &[10, 20] {
                let pred = index.predict(user, movie);
                assert!((0.0..=5.0).contains(&pred));
            }
        }
    }

    #[test]
    fn test_unknown_ids_predict_zero() {
        let index = SimilarityIndex::fit(&three_user_fixture(), 1).unwrap();
        assert_eq!(index.predict(99, 10), 0.0);
        assert_eq!(index.predict(1, 999), 0.0);
    }

    #[test]
    fn test_zero_denominator_guard() {
        // User 3 overlaps with nobody, so every neighbor similarity is 0
        // and the weighted average has a zero denominator
        let ratings = vec![
            rating(1, 10, 4.0),
            rating(1, 30, 5.0),
            rating(2, 10, 4.0),
            rating(3, 40, 3.0),
        ];
        let index = SimilarityIndex::fit(&ratings, DEFAULT_K_NEIGHBORS).unwrap();
        // Neighbor (user 1) rated 30 -> prediction is their rating
        assert!((index.predict(2, 30) - 5.0).abs() < 1e-5);
        // User 3 is known but disjoint from all raters of movie 30
        assert_eq!(index.predict(3, 30), 0.0);
    }

    #[test]
    fn test_duplicate_events_average() {
        let ratings = vec![
            rating(1, 10, 2.0),
            rating(1, 10, 4.0),
            rating(2, 10, 3.0),
            rating(2, 20, 5.0),
        ];
        let index = SimilarityIndex::fit(&ratings, 1).unwrap();
        // User 1's cell for movie 10 is the mean of the two events (3.0),
        // which is what user 2's neighborhood sees
        assert!((index.predict(2, 10) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_predict_batch_matches_single_predictions() {
        let index = SimilarityIndex::fit(&three_user_fixture(), 2).unwrap();
        let batch = index.predict_batch(1, &[10, 20, 999]);
        assert_eq!(batch.len(), 3);
        for (&movie, &score) in &batch {
            assert_eq!(score, index.predict(1, movie));
        }
        // Unknown movies keep the 0.0 fallback in batch form too
        assert_eq!(batch[&999], 0.0);
    }

    #[test]
    fn test_rated_movies() {
        let index = SimilarityIndex::fit(&three_user_fixture(), 1).unwrap();
        let rated = index.rated_movies(1);
        assert_eq!(rated.len(), 2);
        assert!(rated.contains(&10));
        assert!(index.rated_movies(42).is_empty());
    }

    #[test]
    fn test_predict_is_deterministic() {
        let index = SimilarityIndex::fit(&three_user_fixture(), 2).unwrap();
        let a = index.predict(1, 20);
        let b = index.predict(1, 20);
        assert_eq!(a, b);
    }
}
