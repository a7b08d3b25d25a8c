//! Core domain types for the recommendation engine.
//!
//! This module defines the records that flow between the data layer, the
//! signal indices, and the hybrid engine. Invariants are enforced at
//! construction time (see [`Rating::new`]) so downstream code never has to
//! re-validate them.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// Minimum valid rating value
pub const MIN_RATING: f32 = 0.5;

/// Maximum valid rating value
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the catalog. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Genre tags in catalog order; may be empty ("(no genres listed)")
    pub genres: Vec<Genre>,
}

impl Movie {
    /// Genre tags rendered as a single text document, e.g. "Action Sci-Fi".
    ///
    /// Used as the base of the content feature text for the TF-IDF index.
    pub fn genre_text(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Movie genres from the MovieLens controlled vocabulary.
///
/// The 18 classic genres plus IMAX (present in the ml-latest datasets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Imax,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Parse a single MovieLens genre tag.
    ///
    /// Accepts both "Children" (ml-latest) and "Children's" (ml-1m).
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Action" => Ok(Genre::Action),
            "Adventure" => Ok(Genre::Adventure),
            "Animation" => Ok(Genre::Animation),
            "Children" | "Children's" => Ok(Genre::Children),
            "Comedy" => Ok(Genre::Comedy),
            "Crime" => Ok(Genre::Crime),
            "Documentary" => Ok(Genre::Documentary),
            "Drama" => Ok(Genre::Drama),
            "Fantasy" => Ok(Genre::Fantasy),
            "Film-Noir" => Ok(Genre::FilmNoir),
            "Horror" => Ok(Genre::Horror),
            "IMAX" => Ok(Genre::Imax),
            "Musical" => Ok(Genre::Musical),
            "Mystery" => Ok(Genre::Mystery),
            "Romance" => Ok(Genre::Romance),
            "Sci-Fi" => Ok(Genre::SciFi),
            "Thriller" => Ok(Genre::Thriller),
            "War" => Ok(Genre::War),
            "Western" => Ok(Genre::Western),
            _ => Err(CatalogError::InvalidValue {
                field: "genre".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Imax => "IMAX",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating event: one user rated one movie at one point in time.
///
/// The rating log is append-only and multiple ratings per (user, movie) pair
/// are permitted as separate events; nothing deduplicates or overwrites them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value in [0.5, 5.0], stepped by 0.5
    pub value: f32,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

impl Rating {
    /// Construct a validated rating.
    ///
    /// Rejects values outside [0.5, 5.0] or off the half-star grid, so a
    /// `Rating` that exists is always well-formed.
    pub fn new(user_id: UserId, movie_id: MovieId, value: f32, timestamp: i64) -> Result<Self> {
        let doubled = value * 2.0;
        if !(MIN_RATING..=MAX_RATING).contains(&value) || (doubled - doubled.round()).abs() > 1e-6 {
            return Err(CatalogError::InvalidValue {
                field: "rating".to_string(),
                value: value.to_string(),
            });
        }
        Ok(Self {
            user_id,
            movie_id,
            value,
            timestamp,
        })
    }
}
