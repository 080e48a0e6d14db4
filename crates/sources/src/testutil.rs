//! Shared fixtures for unit tests in this crate.

use data_loader::{Movie, MovieId, RatingEntry, UserId};

/// A well-formed English-language movie with the given genres.
pub fn test_movie(id: MovieId, title: &str, genres: &[&str]) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        alternate_titles: vec![],
        language: "en".to_string(),
        year: Some(2000),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        keywords: vec![],
        overview: format!("{} overview text", title),
        director: "Test Director".to_string(),
        actors: vec!["Actor One".to_string(), "Actor Two".to_string()],
        production_companies: vec!["Test Studio".to_string()],
        popularity: 10.0 + id as f32,
        vote_average: 7.0,
        vote_count: 100 * id,
        sentiment_rating: Some(3.0),
    }
}

pub fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> RatingEntry {
    RatingEntry {
        user_id,
        movie_id,
        rating: value,
        timestamp: 1_000_000,
    }
}
