//! Benchmarks for the similarity engines.
//!
//! Run with: cargo bench --package sources
//!
//! Uses a synthetic corpus so the bench runs without any dataset on disk.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Movie, RatingEntry};
use sources::{
    CollaborativeSimilarityEngine, ContentSimilarityEngine, FeatureBuilder, GroupWeights,
    InteractionMatrixBuilder,
};
use std::sync::Arc;

const CORPUS_SIZE: u32 = 2_000;
const USERS: u32 = 500;

fn synthetic_movie(id: u32) -> Movie {
    let genre_pool = ["Action", "Drama", "Comedy", "Thriller", "Romance", "Horror"];
    Movie {
        id,
        title: format!("Synthetic Movie {}", id),
        alternate_titles: vec![],
        language: "en".to_string(),
        year: Some(1980 + (id % 45) as u16),
        genres: vec![
            genre_pool[(id % 6) as usize].to_string(),
            genre_pool[(id % 5) as usize].to_string(),
        ],
        keywords: vec![format!("keyword{}", id % 40), format!("keyword{}", id % 17)],
        overview: format!(
            "A story about subject{} and subject{} in place{}",
            id % 50,
            id % 23,
            id % 11
        ),
        director: format!("Director {}", id % 100),
        actors: vec![format!("Actor {}", id % 200), format!("Actor {}", id % 150)],
        production_companies: vec![format!("Studio {}", id % 30)],
        popularity: (id % 100) as f32,
        vote_average: 5.0 + (id % 50) as f32 / 10.0,
        vote_count: 100 + id,
        sentiment_rating: Some((id % 5) as f32 * 0.8),
    }
}

fn synthetic_ratings() -> Vec<RatingEntry> {
    let mut ratings = Vec::new();
    for user in 0..USERS {
        // Each user rates a deterministic spread of movies
        for step in 0..40u32 {
            let movie = (user * 7 + step * 53) % CORPUS_SIZE + 1;
            ratings.push(RatingEntry {
                user_id: user + 1,
                movie_id: movie,
                rating: 1.0 + ((user + step) % 9) as f32 / 2.0,
                timestamp: 1_000_000 + step as i64,
            });
        }
    }
    ratings
}

fn bench_content_similar_to(c: &mut Criterion) {
    let movies: Vec<Movie> = (1..=CORPUS_SIZE).map(synthetic_movie).collect();
    let build = FeatureBuilder::new(GroupWeights::default())
        .expect("default weights are valid")
        .build(&movies);
    let engine = ContentSimilarityEngine::new(Arc::new(build.store));

    c.bench_function("content_similar_to", |b| {
        b.iter(|| {
            let scores = engine.similar_to(black_box(1), black_box(20)).unwrap();
            black_box(scores)
        })
    });
}

fn bench_collaborative_neighbors(c: &mut Criterion) {
    let matrix = InteractionMatrixBuilder::new(5).build(&synthetic_ratings());
    let probe = matrix
        .columns()
        .first()
        .map(|col| col.movie_id)
        .expect("synthetic matrix has columns");
    let engine = CollaborativeSimilarityEngine::new(Arc::new(matrix));

    c.bench_function("collaborative_nearest_neighbors", |b| {
        b.iter(|| {
            let scores = engine
                .nearest_neighbors(black_box(probe), black_box(10))
                .unwrap();
            black_box(scores)
        })
    });
}

fn bench_feature_build(c: &mut Criterion) {
    let movies: Vec<Movie> = (1..=CORPUS_SIZE).map(synthetic_movie).collect();
    let builder = FeatureBuilder::new(GroupWeights::default()).expect("default weights are valid");

    c.bench_function("feature_build", |b| {
        b.iter(|| {
            let build = builder.build(black_box(&movies));
            black_box(build)
        })
    });
}

criterion_group!(
    benches,
    bench_content_similar_to,
    bench_collaborative_neighbors,
    bench_feature_build
);
criterion_main!(benches);
