//! The in-memory movie catalog.
//!
//! `MovieCatalog` holds the enriched movie records and the raw rating
//! entries, with HashMap indices for O(1) lookups. It is built once per data
//! refresh and read-only afterward; the engine snapshots it wholesale.

use crate::types::{Movie, MovieId, RatingEntry};
use std::collections::HashMap;

/// Read-only store of movies and ratings with lookup indices.
#[derive(Debug, Default)]
pub struct MovieCatalog {
    movies: HashMap<MovieId, Movie>,
    /// All ratings received by each movie
    movie_ratings: HashMap<MovieId, Vec<RatingEntry>>,
    /// Total number of rating entries across all movies
    rating_count: usize,
}

impl MovieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-parsed records.
    pub fn from_records(movies: Vec<Movie>, ratings: Vec<RatingEntry>) -> Self {
        let mut catalog = Self::new();
        for movie in movies {
            catalog.insert_movie(movie);
        }
        for rating in ratings {
            catalog.insert_rating(rating);
        }
        catalog
    }

    // Getters return references; the catalog keeps ownership.

    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    /// All ratings for a movie, or an empty slice if it has none.
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[RatingEntry] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn rating_count_for(&self, movie_id: MovieId) -> usize {
        self.get_movie_ratings(movie_id).len()
    }

    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// All movie ids in ascending order, for deterministic iteration.
    pub fn movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Flat view over every rating entry in the catalog.
    pub fn all_ratings(&self) -> impl Iterator<Item = &RatingEntry> {
        self.movie_ratings.values().flatten()
    }

    /// Case-insensitive substring search over canonical and alternate
    /// titles. Exact matches sort before substring matches, then by vote
    /// count descending.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(&Movie, usize)> = Vec::new();
        for movie in self.movies.values() {
            let mut best: Option<usize> = None;
            for title in std::iter::once(&movie.title).chain(movie.alternate_titles.iter()) {
                let lowered = title.to_lowercase();
                if lowered == needle {
                    best = Some(0);
                    break;
                } else if lowered.contains(&needle) {
                    best = Some(best.unwrap_or(1));
                }
            }
            if let Some(relevance) = best {
                matches.push((movie, relevance));
            }
        }

        matches.sort_by(|a, b| {
            a.1.cmp(&b.1)
                .then_with(|| b.0.vote_count.cmp(&a.0.vote_count))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        matches.into_iter().take(limit).map(|(m, _)| m).collect()
    }

    /// Insert a movie into the catalog
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update the per-movie index
    pub fn insert_rating(&mut self, rating: RatingEntry) {
        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
        self.rating_count += 1;
    }

    /// Get counts for logging/validation: (movies, ratings)
    pub fn counts(&self) -> (usize, usize) {
        (self.movies.len(), self.rating_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str, alternates: &[&str]) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            alternate_titles: alternates.iter().map(|s| s.to_string()).collect(),
            language: "en".to_string(),
            year: Some(2009),
            genres: vec!["Drama".to_string()],
            keywords: vec![],
            overview: String::new(),
            director: String::new(),
            actors: vec![],
            production_companies: vec![],
            popularity: 1.0,
            vote_average: 7.0,
            vote_count: id * 100,
            sentiment_rating: None,
        }
    }

    fn create_test_catalog() -> MovieCatalog {
        let movies = vec![
            movie(1, "Avatar", &["阿凡达"]),
            movie(2, "Avatar: The Way of Water", &[]),
            movie(3, "The Matrix", &[]),
        ];
        let ratings = vec![
            RatingEntry {
                user_id: 1,
                movie_id: 1,
                rating: 5.0,
                timestamp: 1_000_000,
            },
            RatingEntry {
                user_id: 2,
                movie_id: 1,
                rating: 4.0,
                timestamp: 1_000_001,
            },
            RatingEntry {
                user_id: 1,
                movie_id: 3,
                rating: 3.5,
                timestamp: 1_000_002,
            },
        ];
        MovieCatalog::from_records(movies, ratings)
    }

    #[test]
    fn test_counts_and_lookup() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.counts(), (3, 3));
        assert_eq!(catalog.get_movie(1).unwrap().title, "Avatar");
        assert!(catalog.get_movie(99).is_none());
        assert_eq!(catalog.rating_count_for(1), 2);
        assert_eq!(catalog.rating_count_for(2), 0);
    }

    #[test]
    fn test_movie_ids_sorted() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.movie_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_search_prefers_exact_match() {
        let catalog = create_test_catalog();
        let hits = catalog.search_titles("avatar", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn test_search_covers_alternate_titles() {
        let catalog = create_test_catalog();
        let hits = catalog.search_titles("阿凡达", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }
}
