//! Engine facade with an explicit fitted/unfitted lifecycle.
//!
//! [`RecommenderService`] owns the configuration and, once [`fit`] has
//! run, a [`Recommender`]. Every query method returns
//! [`EngineError::NotFitted`] until then, so callers never observe a
//! half-built pipeline.
//!
//! [`fit`]: RecommenderService::fit

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{info, instrument};

use catalog::{Movie, MovieCatalog, MovieId, Rating, RatingLog, UserId};
use signals::{ContentIndex, LatentFactors, NoveltyIndex, SimilarityIndex};

use crate::config::{EngineConfig, HybridWeights};
use crate::error::{EngineError, Result};
use crate::explain::Explanation;
use crate::recommender::{Recommendation, RecommendOptions, Recommender};

/// Snapshot of engine state for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub fitted: bool,
    pub movie_count: usize,
    pub rating_count: usize,
    pub user_count: usize,
    pub weights: HybridWeights,
}

/// Facade over the full recommendation pipeline.
pub struct RecommenderService {
    config: EngineConfig,
    recommender: Option<Recommender>,
}

impl RecommenderService {
    /// Create an unfitted service.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            recommender: None,
        }
    }

    /// Build every index from catalog and rating data.
    ///
    /// Tag text, when present for a movie, is appended to its genre text
    /// before content indexing. Fails on an empty catalog or an empty
    /// rating set; on failure the service stays in its previous state.
    #[instrument(skip_all)]
    pub fn fit(
        &mut self,
        movies: Vec<Movie>,
        ratings: Vec<Rating>,
        tags: HashMap<MovieId, String>,
        latent: LatentFactors,
    ) -> Result<()> {
        let catalog = Arc::new(MovieCatalog::new(movies)?);
        let log = Arc::new(RatingLog::new(ratings));
        // Indices are fitted against a frozen snapshot; ratings appended
        // later influence liked-sets and cold-start checks only.
        let snapshot = log.snapshot();

        let docs: Vec<(MovieId, String)> = catalog
            .iter()
            .map(|movie| {
                let mut text = movie.genre_text();
                if let Some(tag_text) = tags.get(&movie.id) {
                    text.push(' ');
                    text.push_str(tag_text);
                }
                (movie.id, text)
            })
            .collect();

        let similarity = Arc::new(SimilarityIndex::fit(&snapshot, self.config.k_neighbors)?);
        let content = Arc::new(ContentIndex::fit(&docs, self.config.max_features)?);
        let novelty = Arc::new(NoveltyIndex::fit(&snapshot, self.config.novelty_alpha)?);

        info!(
            movies = catalog.len(),
            ratings = snapshot.len(),
            vocabulary = content.vocabulary_size(),
            "engine fitted"
        );

        self.recommender = Some(Recommender::new(
            catalog,
            log,
            similarity,
            content,
            Arc::new(latent),
            novelty,
            &self.config,
        ));
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.recommender.is_some()
    }

    /// Top-N recommendations for a user.
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
        options: RecommendOptions,
    ) -> Result<Vec<Recommendation>> {
        Ok(self.fitted()?.recommend(user_id, n, options))
    }

    /// Explain one (user, movie) score; `None` for unknown movies.
    pub fn explain(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<Option<(Recommendation, Explanation)>> {
        Ok(self.fitted()?.explain_movie(user_id, movie_id))
    }

    /// Movies most similar to the given one by content.
    pub fn similar_movies(&self, movie_id: MovieId, top_k: usize) -> Result<Vec<(Movie, f32)>> {
        let recommender = self.fitted()?;
        let similar = recommender
            .content()
            .similar_movies(movie_id, top_k)
            .into_iter()
            .filter_map(|(id, score)| {
                recommender.catalog().get(id).map(|m| (m.clone(), score))
            })
            .collect();
        Ok(similar)
    }

    /// Append a live rating event.
    ///
    /// The new rating is visible to liked-set and cold-start logic
    /// immediately; fitted indices pick it up on the next [`fit`].
    ///
    /// [`fit`]: RecommenderService::fit
    pub fn add_rating(&self, user_id: UserId, movie_id: MovieId, value: f32) -> Result<()> {
        let recommender = self.fitted()?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let rating = Rating::new(user_id, movie_id, value, timestamp)?;
        recommender.log().append(rating);
        info!(user_id, movie_id, value, "rating recorded");
        Ok(())
    }

    /// Whether the user has rated the movie, counting live appends.
    pub fn has_rated(&self, user_id: UserId, movie_id: MovieId) -> Result<bool> {
        Ok(self.fitted()?.log().has_rated(user_id, movie_id))
    }

    /// Case-insensitive title search over the catalog.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<Movie>> {
        Ok(self
            .fitted()?
            .catalog()
            .search(query, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Catalog metadata for one movie.
    pub fn movie_info(&self, movie_id: MovieId) -> Result<Option<Movie>> {
        Ok(self.fitted()?.catalog().get(movie_id).cloned())
    }

    /// Engine status snapshot.
    pub fn stats(&self) -> ServiceStats {
        match &self.recommender {
            Some(recommender) => ServiceStats {
                fitted: true,
                movie_count: recommender.catalog().len(),
                rating_count: recommender.log().len(),
                user_count: recommender.log().user_count(),
                weights: self.config.weights,
            },
            None => ServiceStats {
                fitted: false,
                movie_count: 0,
                rating_count: 0,
                user_count: 0,
                weights: self.config.weights,
            },
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn fitted(&self) -> Result<&Recommender> {
        self.recommender.as_ref().ok_or(EngineError::NotFitted)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Genre;

    fn sample_movies() -> Vec<Movie> {
        vec![
            Movie {
                id: 1,
                title: "Ronin".to_string(),
                year: Some(1998),
                genres: vec![Genre::Action, Genre::Thriller],
            },
            Movie {
                id: 2,
                title: "Amelie".to_string(),
                year: Some(2001),
                genres: vec![Genre::Comedy, Genre::Romance],
            },
            Movie {
                id: 3,
                title: "Solaris".to_string(),
                year: Some(1972),
                genres: vec![Genre::Drama, Genre::SciFi],
            },
        ]
    }

    fn sample_ratings() -> Vec<Rating> {
        vec![
            Rating::new(1, 1, 5.0, 0).unwrap(),
            Rating::new(1, 2, 2.0, 1).unwrap(),
            Rating::new(2, 1, 4.0, 2).unwrap(),
            Rating::new(2, 3, 4.5, 3).unwrap(),
        ]
    }

    fn fitted_service() -> RecommenderService {
        let mut service = RecommenderService::new(EngineConfig::default());
        let ratings = sample_ratings();
        let latent = LatentFactors::bias_baseline(&ratings);
        service
            .fit(sample_movies(), ratings, HashMap::new(), latent)
            .unwrap();
        service
    }

    #[test]
    fn test_unfitted_rejects_queries() {
        let service = RecommenderService::new(EngineConfig::default());
        assert!(!service.is_fitted());
        assert!(matches!(
            service.recommend(1, 5, RecommendOptions::default()),
            Err(EngineError::NotFitted)
        ));
        assert!(matches!(
            service.explain(1, 1),
            Err(EngineError::NotFitted)
        ));
        assert!(matches!(
            service.add_rating(1, 1, 4.0),
            Err(EngineError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_then_recommend() {
        let service = fitted_service();
        assert!(service.is_fitted());
        let recs = service.recommend(1, 5, RecommendOptions::default()).unwrap();
        assert!(!recs.is_empty());
    }

    #[test]
    fn test_fit_empty_catalog_fails() {
        let mut service = RecommenderService::new(EngineConfig::default());
        let ratings = sample_ratings();
        let latent = LatentFactors::bias_baseline(&ratings);
        let result = service.fit(Vec::new(), ratings, HashMap::new(), latent);
        assert!(result.is_err());
        assert!(!service.is_fitted());
    }

    #[test]
    fn test_fit_empty_ratings_fails() {
        let mut service = RecommenderService::new(EngineConfig::default());
        let result = service.fit(
            sample_movies(),
            Vec::new(),
            HashMap::new(),
            LatentFactors::bias_baseline(&[]),
        );
        assert!(result.is_err());
        assert!(!service.is_fitted());
    }

    #[test]
    fn test_add_rating_visible_immediately() {
        let service = fitted_service();
        assert!(!service.has_rated(1, 3).unwrap());
        service.add_rating(1, 3, 4.5).unwrap();
        assert!(service.has_rated(1, 3).unwrap());
    }

    #[test]
    fn test_add_rating_validates_value() {
        let service = fitted_service();
        assert!(service.add_rating(1, 3, 6.0).is_err());
        assert!(service.add_rating(1, 3, 4.3).is_err());
    }

    #[test]
    fn test_search_and_movie_info() {
        let service = fitted_service();
        let hits = service.search("ame", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Amelie");

        let info = service.movie_info(3).unwrap().unwrap();
        assert_eq!(info.title, "Solaris");
        assert!(service.movie_info(99).unwrap().is_none());
    }

    #[test]
    fn test_stats_reflect_state() {
        let unfitted = RecommenderService::new(EngineConfig::default());
        let stats = unfitted.stats();
        assert!(!stats.fitted);
        assert_eq!(stats.movie_count, 0);

        let service = fitted_service();
        let stats = service.stats();
        assert!(stats.fitted);
        assert_eq!(stats.movie_count, 3);
        assert_eq!(stats.rating_count, 4);
        assert_eq!(stats.user_count, 2);
    }

    #[test]
    fn test_similar_movies_resolves_metadata() {
        let service = fitted_service();
        let similar = service.similar_movies(1, 2).unwrap();
        assert!(similar.iter().all(|(movie, _)| movie.id != 1));
        assert!(service.similar_movies(99, 2).unwrap().is_empty());
    }
}
