//! Append-only rating log.
//!
//! The log is the only mutable state at serving time. Appends are visible
//! immediately to readers of the raw log (`has_rated`, `knows_user`,
//! `liked_movies`), but the fitted signal indices work from a frozen
//! `snapshot` taken at fit time and do not see new ratings until the next
//! fit.

use crate::types::{MovieId, Rating, UserId};
use std::collections::HashSet;
use std::sync::RwLock;

/// Threshold above which a rating counts as "liked"
pub const LIKED_THRESHOLD: f32 = 4.0;

/// Concurrent append-only log of rating events.
///
/// Reads never block appends for long: the lock is held only for the push or
/// the scan, and fitted structures read from their own snapshot instead.
#[derive(Debug)]
pub struct RatingLog {
    inner: RwLock<Vec<Rating>>,
}

impl RatingLog {
    /// Create a log seeded with an initial batch of ratings.
    pub fn new(ratings: Vec<Rating>) -> Self {
        Self {
            inner: RwLock::new(ratings),
        }
    }

    /// Append a rating event. Safe under concurrent appends.
    pub fn append(&self, rating: Rating) {
        self.inner
            .write()
            .expect("rating log lock poisoned")
            .push(rating);
    }

    /// Copy of the full log as of now. Fit phases call this once and work
    /// from the frozen copy.
    pub fn snapshot(&self) -> Vec<Rating> {
        self.inner
            .read()
            .expect("rating log lock poisoned")
            .clone()
    }

    /// Whether the user has rated this movie, including post-fit appends.
    pub fn has_rated(&self, user_id: UserId, movie_id: MovieId) -> bool {
        self.inner
            .read()
            .expect("rating log lock poisoned")
            .iter()
            .any(|r| r.user_id == user_id && r.movie_id == movie_id)
    }

    /// Whether the user appears anywhere in the log. Users absent from the
    /// log take the cold-start path.
    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.inner
            .read()
            .expect("rating log lock poisoned")
            .iter()
            .any(|r| r.user_id == user_id)
    }

    /// Movies the user rated at or above `threshold`, in log order.
    pub fn liked_movies(&self, user_id: UserId, threshold: f32) -> Vec<MovieId> {
        self.inner
            .read()
            .expect("rating log lock poisoned")
            .iter()
            .filter(|r| r.user_id == user_id && r.value >= threshold)
            .map(|r| r.movie_id)
            .collect()
    }

    /// All movies the user has rated, as a set.
    pub fn rated_movies(&self, user_id: UserId) -> HashSet<MovieId> {
        self.inner
            .read()
            .expect("rating log lock poisoned")
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.movie_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("rating log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct users in the log.
    pub fn user_count(&self) -> usize {
        let guard = self.inner.read().expect("rating log lock poisoned");
        let users: HashSet<UserId> = guard.iter().map(|r| r.user_id).collect();
        users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating::new(user_id, movie_id, value, 1_000_000).unwrap()
    }

    #[test]
    fn test_append_is_visible_to_raw_reads() {
        let log = RatingLog::new(vec![rating(1, 10, 4.0)]);
        assert!(!log.has_rated(1, 20));
        assert!(!log.knows_user(2));

        log.append(rating(1, 20, 3.0));
        log.append(rating(2, 10, 5.0));

        assert!(log.has_rated(1, 20));
        assert!(log.knows_user(2));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let log = RatingLog::new(vec![rating(1, 10, 4.0)]);
        let snap = log.snapshot();
        log.append(rating(1, 20, 3.0));

        assert_eq!(snap.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_liked_movies_threshold() {
        let log = RatingLog::new(vec![
            rating(1, 10, 4.5),
            rating(1, 20, 3.5),
            rating(1, 30, 4.0),
            rating(2, 40, 5.0),
        ]);

        let liked = log.liked_movies(1, LIKED_THRESHOLD);
        assert_eq!(liked, vec![10, 30]);
        assert!(log.liked_movies(3, LIKED_THRESHOLD).is_empty());
    }

    #[test]
    fn test_duplicate_events_are_kept() {
        let log = RatingLog::new(vec![]);
        log.append(rating(1, 10, 2.0));
        log.append(rating(1, 10, 4.5));

        // Both events stay in the log; no dedup or overwrite
        assert_eq!(log.len(), 2);
        assert_eq!(log.rated_movies(1).len(), 1);
    }

    #[test]
    fn test_user_count() {
        let log = RatingLog::new(vec![rating(1, 10, 4.0), rating(1, 20, 4.0), rating(2, 10, 3.0)]);
        assert_eq!(log.user_count(), 2);
    }
}
