//! Content-based signal: TF-IDF over genre/tag text plus an item-item
//! cosine similarity matrix.
//!
//! ## Algorithm
//! 1. Tokenize each movie's feature text (lowercase, unigrams + bigrams,
//!    english stop-word filtering)
//! 2. Build a vocabulary bounded to `max_features`, selected by corpus
//!    frequency (ties by term, for determinism)
//! 3. Weight terms by smoothed idf, l2-normalize each document vector
//! 4. Precompute the item-item cosine matrix
//!
//! `predict` scores a candidate as the mean similarity to the movies the
//! user rated at or above the liked threshold.

use crate::error::{Result, SignalError};
use catalog::{LIKED_THRESHOLD, MovieId, RatingLog, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Default bound on the TF-IDF vocabulary size
pub const DEFAULT_MAX_FEATURES: usize = 500;

/// Common english words carrying no content signal in genre/tag text.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "he", "her",
    "his", "if", "in", "is", "it", "its", "my", "no", "not", "of", "on", "or", "she", "so",
    "that", "the", "their", "them", "they", "this", "to", "very", "was", "we", "when", "where",
    "which", "who", "will", "with", "you", "your",
];

/// Fitted content index. Read-only after fit.
#[derive(Debug)]
pub struct ContentIndex {
    movie_ids: Vec<MovieId>,
    movie_pos: HashMap<MovieId, usize>,
    /// Dense item-item cosine similarity, row-major
    similarity: Vec<f32>,
    vocabulary_size: usize,
}

impl ContentIndex {
    /// Fit the index from per-movie feature documents (genre text plus
    /// aggregated tags), in catalog order.
    pub fn fit(docs: &[(MovieId, String)], max_features: usize) -> Result<Self> {
        if docs.is_empty() {
            return Err(SignalError::EmptyItems {
                component: "ContentIndex",
            });
        }

        let tokenized: Vec<Vec<String>> = docs.par_iter().map(|(_, text)| tokenize(text)).collect();

        // Vocabulary bounded by corpus frequency, ties broken by term
        let mut corpus_counts: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            for token in tokens {
                *corpus_counts.entry(token.as_str()).or_insert(0) += 1;
            }
        }
        let mut terms: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        terms.truncate(max_features);
        let vocab: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(i, (term, _))| (term.to_string(), i))
            .collect();

        // Document frequency per vocabulary term
        let mut doc_freq = vec![0u32; vocab.len()];
        for tokens in &tokenized {
            let mut seen = vec![false; vocab.len()];
            for token in tokens {
                if let Some(&idx) = vocab.get(token) {
                    if !seen[idx] {
                        seen[idx] = true;
                        doc_freq[idx] += 1;
                    }
                }
            }
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n_docs = docs.len() as f32;
        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        // Sparse l2-normalized tf-idf rows
        let rows: Vec<Vec<(usize, f32)>> = tokenized
            .par_iter()
            .map(|tokens| {
                let mut counts: HashMap<usize, f32> = HashMap::new();
                for token in tokens {
                    if let Some(&idx) = vocab.get(token) {
                        *counts.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                let mut row: Vec<(usize, f32)> = counts
                    .into_iter()
                    .map(|(idx, tf)| (idx, tf * idf[idx]))
                    .collect();
                let norm: f32 = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for (_, w) in row.iter_mut() {
                        *w /= norm;
                    }
                }
                row.sort_unstable_by_key(|&(idx, _)| idx);
                row
            })
            .collect();

        debug!(
            movies = docs.len(),
            vocabulary = vocab.len(),
            "computing content similarity matrix"
        );
        let n = docs.len();
        let mut similarity = vec![0.0f32; n * n];
        similarity
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, out_row)| {
                for (j, out) in out_row.iter_mut().enumerate() {
                    *out = sparse_dot(&rows[i], &rows[j]);
                }
            });

        let movie_ids: Vec<MovieId> = docs.iter().map(|(id, _)| *id).collect();
        let movie_pos: HashMap<MovieId, usize> =
            movie_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        Ok(Self {
            movie_ids,
            movie_pos,
            similarity,
            vocabulary_size: vocab.len(),
        })
    }

    /// Content affinity of `movie_id` for this user, in [0, 1].
    ///
    /// Liked movies come from the rating log (value >= 4.0); users without
    /// liked movies score 0.0 for every candidate.
    pub fn predict(&self, user_id: UserId, movie_id: MovieId, log: &RatingLog) -> f32 {
        let liked = log.liked_movies(user_id, LIKED_THRESHOLD);
        self.predict_from_liked(movie_id, &liked)
    }

    /// Same computation as [`predict`](Self::predict) with the liked set
    /// already gathered, so rankers can collect it once per request.
    pub fn predict_from_liked(&self, movie_id: MovieId, liked: &[MovieId]) -> f32 {
        let Some(&m) = self.movie_pos.get(&movie_id) else {
            return 0.0;
        };
        if liked.is_empty() {
            return 0.0;
        }

        let n = self.movie_ids.len();
        let row = &self.similarity[m * n..(m + 1) * n];

        // Liked movies absent from the index are skipped, not counted as 0
        let mut total = 0.0f32;
        let mut comparable = 0u32;
        for liked_id in liked {
            if let Some(&l) = self.movie_pos.get(liked_id) {
                total += row[l];
                comparable += 1;
            }
        }

        if comparable == 0 {
            0.0
        } else {
            total / comparable as f32
        }
    }

    /// Top-k most similar movies, excluding the movie itself.
    ///
    /// Returns an empty list for an unknown movie.
    pub fn similar_movies(&self, movie_id: MovieId, top_k: usize) -> Vec<(MovieId, f32)> {
        let Some(&m) = self.movie_pos.get(&movie_id) else {
            return Vec::new();
        };

        let n = self.movie_ids.len();
        let row = &self.similarity[m * n..(m + 1) * n];

        let mut ranked: Vec<(MovieId, f32)> = row
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != m)
            .map(|(i, &score)| (self.movie_ids[i], score))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(top_k);
        ranked
    }

    /// Number of terms retained in the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }
}

/// Lowercase word tokens plus adjacent-word bigrams, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();

    let mut tokens = words.clone();
    for pair in words.windows(2) {
        tokens.push(format!("{} {}", pair[0], pair[1]));
    }
    tokens
}

/// Dot product of two sparse rows sorted by index.
fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let mut total = 0.0f32;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                total += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Rating;

    fn docs() -> Vec<(MovieId, String)> {
        vec![
            (1, "Action Sci-Fi space future".to_string()),
            (2, "Action Sci-Fi space battle".to_string()),
            (3, "Romance Drama period love".to_string()),
        ]
    }

    fn log_with(ratings: Vec<(UserId, MovieId, f32)>) -> RatingLog {
        RatingLog::new(
            ratings
                .into_iter()
                .map(|(u, m, v)| Rating::new(u, m, v, 1_000_000).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_fit_rejects_empty_docs() {
        assert!(ContentIndex::fit(&[], DEFAULT_MAX_FEATURES).is_err());
    }

    #[test]
    fn test_tokenize_unigrams_and_bigrams() {
        let tokens = tokenize("Action Sci-Fi");
        assert!(tokens.contains(&"action".to_string()));
        assert!(tokens.contains(&"sci".to_string()));
        assert!(tokens.contains(&"fi".to_string()));
        assert!(tokens.contains(&"sci fi".to_string()));
    }

    #[test]
    fn test_tokenize_drops_stop_words() {
        let tokens = tokenize("the space and the future");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"space".to_string()));
    }

    #[test]
    fn test_similar_items_ranks_shared_vocabulary_first() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        let similar = index.similar_movies(1, 2);
        assert_eq!(similar.len(), 2);
        // Movie 2 shares most of movie 1's vocabulary; movie 3 shares none
        assert_eq!(similar[0].0, 2);
        assert!(similar[0].1 > similar[1].1);
    }

    #[test]
    fn test_similar_items_unknown_movie_is_empty() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        assert!(index.similar_movies(99, 5).is_empty());
    }

    #[test]
    fn test_predict_without_liked_movies_is_zero() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        let log = log_with(vec![(1, 1, 3.5), (1, 3, 2.0)]);
        // Everything rated below the liked threshold
        assert_eq!(index.predict(1, 2, &log), 0.0);
    }

    #[test]
    fn test_predict_leans_toward_liked_content() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        let log = log_with(vec![(1, 1, 5.0)]);
        let sci_fi = index.predict(1, 2, &log);
        let period = index.predict(1, 3, &log);
        assert!(sci_fi > period);
        assert!((0.0..=1.0).contains(&sci_fi));
    }

    #[test]
    fn test_predict_skips_liked_movies_missing_from_index() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        // Movie 77 was rated but never indexed; only movie 1 is comparable
        let with_ghost = index.predict_from_liked(2, &[1, 77]);
        let without = index.predict_from_liked(2, &[1]);
        assert_eq!(with_ghost, without);
        // Nothing comparable at all -> 0
        assert_eq!(index.predict_from_liked(2, &[77]), 0.0);
    }

    #[test]
    fn test_unknown_candidate_is_zero() {
        let index = ContentIndex::fit(&docs(), DEFAULT_MAX_FEATURES).unwrap();
        assert_eq!(index.predict_from_liked(404, &[1]), 0.0);
    }

    #[test]
    fn test_vocabulary_is_bounded() {
        let index = ContentIndex::fit(&docs(), 3).unwrap();
        assert!(index.vocabulary_size() <= 3);
    }
}
