//! Hybrid recommendation engine.
//!
//! Combines four signal components into ranked, diversified,
//! explainable movie recommendations.
//!
//! ## Components
//!
//! - [`config`]: blend weights and tuning parameters
//! - [`combiner`]: per-movie hybrid scoring and candidate ranking
//! - [`rerank`]: greedy genre-diversity re-ranking
//! - [`explain`]: dominant-signal explanations
//! - [`recommender`]: top-N orchestration with cold-start fallback
//! - [`service`]: fitted/unfitted lifecycle facade
//!
//! ## Example
//!
//! ```no_run
//! use engine::{EngineConfig, RecommenderService, RecommendOptions};
//! use signals::LatentFactors;
//!
//! # fn main() -> engine::Result<()> {
//! let movies = catalog::parser::parse_movies("data/movies.csv".as_ref())?;
//! let ratings = catalog::parser::parse_ratings("data/ratings.csv".as_ref())?;
//! let latent = LatentFactors::bias_baseline(&ratings);
//!
//! let mut service = RecommenderService::new(EngineConfig::default());
//! service.fit(movies, ratings, Default::default(), latent)?;
//!
//! let recs = service.recommend(42, 10, RecommendOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod combiner;
pub mod config;
pub mod error;
pub mod explain;
pub mod recommender;
pub mod rerank;
pub mod service;

pub use combiner::{HybridCombiner, ScoreBreakdown, ScoredMovie};
pub use config::{EngineConfig, HybridWeights};
pub use error::{EngineError, Result};
pub use explain::{Explanation, Signal, explain};
pub use recommender::{Recommendation, RecommendOptions, Recommender};
pub use rerank::DiversityReranker;
pub use service::{RecommenderService, ServiceStats};
