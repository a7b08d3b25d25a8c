//! The movie catalog: id-keyed lookup plus a stable enumeration order.
//!
//! The catalog is immutable once built. The id-sorted ordering exists so
//! candidate enumeration during ranking is deterministic across runs.

use crate::error::{CatalogError, Result};
use crate::types::{Movie, MovieId};
use std::collections::HashMap;

/// In-memory movie catalog with O(1) lookups by id.
#[derive(Debug)]
pub struct MovieCatalog {
    movies: HashMap<MovieId, Movie>,
    /// Movie ids in ascending order, frozen at construction
    order: Vec<MovieId>,
}

impl MovieCatalog {
    /// Build a catalog from loaded movies.
    ///
    /// An empty catalog is a fit-time fatal error; serving an engine with no
    /// items is never meaningful.
    pub fn new(movies: Vec<Movie>) -> Result<Self> {
        if movies.is_empty() {
            return Err(CatalogError::EmptyCatalog(
                "no movies loaded".to_string(),
            ));
        }

        let mut map = HashMap::with_capacity(movies.len());
        for movie in movies {
            map.insert(movie.id, movie);
        }
        let mut order: Vec<MovieId> = map.keys().copied().collect();
        order.sort_unstable();

        Ok(Self { movies: map, order })
    }

    /// Get a movie by id, or `None` if unknown.
    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All movie ids in ascending order.
    pub fn ids(&self) -> &[MovieId] {
        &self.order
    }

    /// Iterate movies in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.order.iter().filter_map(|id| self.movies.get(id))
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Case-insensitive substring search over titles and genre names.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let query = query.to_lowercase();
        self.iter()
            .filter(|m| {
                m.title.to_lowercase().contains(&query)
                    || m.genres
                        .iter()
                        .any(|g| g.to_string().to_lowercase().contains(&query))
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Genre;

    fn movie(id: MovieId, title: &str, genres: Vec<Genre>) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: None,
            genres,
        }
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        assert!(MovieCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_lookup_and_order() {
        let catalog = MovieCatalog::new(vec![
            movie(3, "C", vec![Genre::Drama]),
            movie(1, "A", vec![Genre::Action]),
            movie(2, "B", vec![Genre::Comedy]),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.ids(), &[1, 2, 3]);
        assert_eq!(catalog.get(2).unwrap().title, "B");
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_search_matches_title_and_genre() {
        let catalog = MovieCatalog::new(vec![
            movie(1, "The Matrix (1999)", vec![Genre::SciFi]),
            movie(2, "Toy Story (1995)", vec![Genre::Animation]),
        ])
        .unwrap();

        let hits = catalog.search("matrix", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);

        let hits = catalog.search("sci-fi", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }
}
