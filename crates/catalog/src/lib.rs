//! # Catalog Crate
//!
//! Domain types and data providers for the hybrid recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Genre, Rating, id aliases)
//! - **movies**: The immutable movie catalog provider
//! - **log**: The append-only rating log provider
//! - **parser**: Parse MovieLens ml-latest CSV files
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{MovieCatalog, RatingLog, parser};
//! use std::path::Path;
//!
//! let data_dir = Path::new("data/ml-latest-small");
//! let movies = parser::parse_movies(&data_dir.join("movies.csv"))?;
//! let ratings = parser::parse_ratings(&data_dir.join("ratings.csv"))?;
//!
//! let catalog = MovieCatalog::new(movies)?;
//! let log = RatingLog::new(ratings);
//!
//! println!("{} movies, {} ratings", catalog.len(), log.len());
//! ```

// Public modules
pub mod error;
pub mod log;
pub mod movies;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use log::{LIKED_THRESHOLD, RatingLog};
pub use movies::MovieCatalog;
pub use types::{Genre, MAX_RATING, MIN_RATING, Movie, MovieId, Rating, UserId};
