//! Integration tests for the query pipeline.
//!
//! These exercise resolve → score → normalize → fuse end-to-end over a
//! small multilingual corpus, without the orchestrator layer.

use data_loader::{Movie, MovieId, RatingEntry};
use pipeline::{fuse, normalize, HybridWeights, QueryResolver, DEFAULT_FUZZY_THRESHOLD};
use sources::{
    CollaborativeSimilarityEngine, ContentSimilarityEngine, FeatureBuilder, GroupWeights,
    InteractionMatrixBuilder, ScoreOrigin, SimilarityError, SimilarityScore,
};
use std::collections::HashMap;
use std::sync::Arc;

fn movie(id: MovieId, title: &str, alternates: &[&str], genres: &[&str], overview: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        alternate_titles: alternates.iter().map(|s| s.to_string()).collect(),
        language: "en".to_string(),
        year: Some(2009),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        keywords: vec![],
        overview: overview.to_string(),
        director: "Some Director".to_string(),
        actors: vec!["Lead Actor".to_string()],
        production_companies: vec!["Big Studio".to_string()],
        popularity: 50.0,
        vote_average: 7.0,
        vote_count: 1000,
        sentiment_rating: Some(3.0),
    }
}

fn rating(user_id: u32, movie_id: MovieId, value: f32) -> RatingEntry {
    RatingEntry {
        user_id,
        movie_id,
        rating: value,
        timestamp: 1_000_000,
    }
}

fn test_corpus() -> Vec<Movie> {
    vec![
        movie(
            1,
            "Avatar",
            &["阿凡达"],
            &["Action", "Science Fiction"],
            "marines explore an alien moon",
        ),
        movie(
            2,
            "Edge of Tomorrow",
            &[],
            &["Action", "Science Fiction"],
            "soldier relives an alien invasion",
        ),
        movie(
            3,
            "Notting Hill",
            &[],
            &["Romance", "Comedy"],
            "a bookseller meets a famous actress",
        ),
        movie(
            4,
            "Arrival",
            &[],
            &["Science Fiction", "Drama"],
            "linguist decodes an alien language",
        ),
        movie(
            5,
            "Love Actually",
            &[],
            &["Romance", "Comedy"],
            "intertwined romances around christmas",
        ),
        movie(
            6,
            "Interstellar",
            &[],
            &["Science Fiction", "Adventure"],
            "explorers travel through a wormhole",
        ),
    ]
}

fn test_ratings() -> Vec<RatingEntry> {
    let mut ratings = Vec::new();
    // Users 1-4 like the science fiction cluster
    for user in 1..=4 {
        ratings.push(rating(user, 1, 5.0));
        ratings.push(rating(user, 2, 4.5));
        ratings.push(rating(user, 4, 4.0));
        ratings.push(rating(user, 6, 4.5));
    }
    // Users 5-7 like the romance cluster
    for user in 5..=7 {
        ratings.push(rating(user, 3, 4.5));
        ratings.push(rating(user, 5, 5.0));
    }
    ratings
}

#[test]
fn test_full_query_pipeline_end_to_end() {
    let movies = test_corpus();
    let build = FeatureBuilder::new(GroupWeights::default())
        .unwrap()
        .build(&movies);
    assert!(build.rejected.is_empty());
    let content = ContentSimilarityEngine::new(Arc::new(build.store));

    let matrix = InteractionMatrixBuilder::new(2).build(&test_ratings());
    let collaborative = CollaborativeSimilarityEngine::new(Arc::new(matrix));

    let resolver = QueryResolver::new(movies.iter(), DEFAULT_FUZZY_THRESHOLD);
    let resolved = resolver.resolve("Avatar").unwrap();
    assert_eq!(resolved.movie_id, 1);

    let content_pool = content.similar_to(resolved.movie_id, 10).unwrap();
    let collab_pool = collaborative
        .nearest_neighbors(resolved.movie_id, 10)
        .unwrap();

    for s in content_pool.iter().chain(collab_pool.iter()) {
        assert!((0.0..=1.0).contains(&s.score));
    }

    let fused = fuse(
        &normalize(&content_pool),
        &normalize(&collab_pool),
        HybridWeights::default(),
        5,
    )
    .unwrap();

    // top_k = 5 over a corpus of 5 candidates returns exactly 5 entries
    // with non-increasing fused scores
    assert_eq!(fused.len(), 5);
    for pair in fused.windows(2) {
        assert!(pair[0].fused_score >= pair[1].fused_score);
    }
    for rec in &fused {
        assert!((0.0..=1.0).contains(&rec.fused_score));
        assert_ne!(rec.movie_id, 1);
    }

    // The sci-fi cluster should outrank the romances: both signals agree
    let top_ids: Vec<MovieId> = fused.iter().take(3).map(|r| r.movie_id).collect();
    assert!(top_ids.contains(&2));
}

#[test]
fn test_multilingual_query_resolves_to_same_movie() {
    let movies = test_corpus();
    let resolver = QueryResolver::new(movies.iter(), DEFAULT_FUZZY_THRESHOLD);

    let latin = resolver.resolve("Avatar").unwrap();
    let non_latin = resolver.resolve("阿凡达").unwrap();
    assert_eq!(latin.movie_id, non_latin.movie_id);
}

#[test]
fn test_fusion_scenario_from_one_sided_scores() {
    // Content scores [B=0.9, C=0.6], collaborative only [C=0.8], weights
    // (0.3, 0.7). The strong one-sided content lead for B must not beat
    // C's collaborative backing: C ranks first.
    let b: MovieId = 20;
    let c: MovieId = 30;

    let content_pool = vec![
        SimilarityScore::new(1, b, 0.9, ScoreOrigin::Content),
        SimilarityScore::new(1, c, 0.6, ScoreOrigin::Content),
    ];
    let collab_pool = vec![SimilarityScore::new(1, c, 0.8, ScoreOrigin::Collaborative)];

    let content = normalize(&content_pool);
    let collab = normalize(&collab_pool);
    // Two-member content pool spreads to {B: 1.0, C: 0.0}; the
    // single-member collaborative pool normalizes to 1.0.
    assert_eq!(content[&b], 1.0);
    assert_eq!(content[&c], 0.0);
    assert_eq!(collab[&c], 1.0);

    let fused = fuse(&content, &collab, HybridWeights::new(0.3, 0.7), 5).unwrap();
    assert_eq!(fused[0].movie_id, c);
    assert!((fused[0].fused_score - 0.7).abs() < 1e-6);
    assert_eq!(fused[1].movie_id, b);
    assert!((fused[1].fused_score - 0.3).abs() < 1e-6);
}

#[test]
fn test_empty_ratings_cold_start_everywhere() {
    let matrix = InteractionMatrixBuilder::new(10).build(&[]);
    assert_eq!(matrix.column_count(), 0);

    let collaborative = CollaborativeSimilarityEngine::new(Arc::new(matrix));
    for id in [1u32, 2, 3] {
        assert!(matches!(
            collaborative.nearest_neighbors(id, 5),
            Err(SimilarityError::ColdStart { .. })
        ));
    }
}

#[test]
fn test_absurd_min_ratings_threshold_degrades_without_build_error() {
    let matrix = InteractionMatrixBuilder::new(1_000_000).build(&test_ratings());
    assert_eq!(matrix.column_count(), 0);

    let collaborative = CollaborativeSimilarityEngine::new(Arc::new(matrix));
    assert!(matches!(
        collaborative.nearest_neighbors(1, 10),
        Err(SimilarityError::ColdStart { .. })
    ));
}

#[test]
fn test_content_only_fusion_still_surfaces_candidates() {
    let content: HashMap<MovieId, f32> = HashMap::from([(2, 1.0), (4, 0.5)]);
    let collab: HashMap<MovieId, f32> = HashMap::new();

    let fused = fuse(&content, &collab, HybridWeights::default(), 5).unwrap();
    assert_eq!(fused.len(), 2);
    // Discounted by the missing collaborative side
    assert!((fused[0].fused_score - 0.3).abs() < 1e-6);
    assert!(fused[0].collaborative_score.is_none());
}
