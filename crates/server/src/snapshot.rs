//! Snapshot building: the batch phase that turns raw records into the
//! immutable state every query reads.
//!
//! A snapshot bundles the catalog, the feature store, the interaction
//! matrix, and the query resolver, all built from the same refresh of
//! source data. Building is embarrassingly parallel across movies and
//! never touches the currently-active snapshot; the caller swaps the new
//! one in atomically when the build succeeds.

use data_loader::{Movie, MovieCatalog, MovieId, RatingEntry};
use pipeline::QueryResolver;
use sources::{
    FeatureBuilder, FeatureStore, GroupWeights, InteractionMatrix, InteractionMatrixBuilder,
    SimilarityError,
};
use pipeline::HybridWeights;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Recognized configuration surface of the engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Attribute-group weights for content similarity. Must sum to 1.0.
    pub group_weights: GroupWeights,
    /// Default content/collaborative fusion weights. Must sum to 1.0.
    /// Callers may override per request.
    pub hybrid_weights: HybridWeights,
    /// Movies with fewer ratings are excluded from the interaction matrix.
    pub min_ratings: u32,
    /// Neighbor count handed to the collaborative engine per query.
    pub k_neighbors: usize,
    /// Minimum fuzzy score the query resolver accepts.
    pub fuzzy_threshold: f64,
    /// The rebuild fails when more than this fraction of movie records is
    /// malformed; below it, bad records are recorded and excluded.
    pub max_rejected_fraction: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_weights: GroupWeights::default(),
            hybrid_weights: HybridWeights::default(),
            min_ratings: 10,
            k_neighbors: 10,
            fuzzy_threshold: pipeline::DEFAULT_FUZZY_THRESHOLD,
            max_rejected_fraction: 0.20,
        }
    }
}

/// Cooperative cancellation signal for a running rebuild.
///
/// Checked between build stages; cancelling aborts the rebuild without
/// corrupting the currently-active snapshot.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Errors that abort a rebuild. The previous snapshot stays active in
/// every case.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Rebuild cancelled")]
    Cancelled,

    #[error("{rejected} of {total} movie records failed integrity checks (ceiling {ceiling})")]
    TooManyRejects {
        rejected: usize,
        total: usize,
        ceiling: f32,
    },

    #[error(transparent)]
    Similarity(#[from] SimilarityError),
}

/// Immutable state published by one successful build. Queries hold an
/// `Arc` to the snapshot they started with; a rebuild never mutates it.
pub struct EngineSnapshot {
    pub catalog: Arc<MovieCatalog>,
    pub features: Arc<FeatureStore>,
    pub matrix: Arc<InteractionMatrix>,
    pub resolver: Arc<QueryResolver>,
    pub config: EngineConfig,
    /// Movies excluded from this snapshot by integrity checks, with reasons.
    pub rejected: Vec<(MovieId, String)>,
}

/// Run the full build phase over one refresh of source data.
///
/// Partial-failure semantics: a malformed movie record is excluded and
/// recorded, unless the malformed fraction exceeds the configured ceiling,
/// in which case the whole rebuild fails.
#[instrument(skip_all, fields(movies = movies.len(), ratings = ratings.len()))]
pub fn build_snapshot(
    movies: Vec<Movie>,
    ratings: Vec<RatingEntry>,
    config: EngineConfig,
    cancel: &CancelToken,
) -> Result<EngineSnapshot, BuildError> {
    // Weight misconfiguration fails before any data is touched
    let feature_builder = FeatureBuilder::new(config.group_weights)?;
    config.hybrid_weights.validate()?;

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // The two sides are independent; build them in parallel
    let matrix_builder = InteractionMatrixBuilder::new(config.min_ratings);
    let (feature_build, matrix) = rayon::join(
        || feature_builder.build(&movies),
        || matrix_builder.build(&ratings),
    );

    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    // Apply the malformed-record ceiling
    let total = movies.len();
    let rejected = feature_build.rejected;
    if total > 0 {
        let fraction = rejected.len() as f32 / total as f32;
        if fraction > config.max_rejected_fraction {
            warn!(
                "Rebuild failed: {}/{} records rejected, above ceiling {}",
                rejected.len(),
                total,
                config.max_rejected_fraction
            );
            return Err(BuildError::TooManyRejects {
                rejected: rejected.len(),
                total,
                ceiling: config.max_rejected_fraction,
            });
        }
    }

    // The catalog and resolver only see movies accepted into the snapshot
    let accepted: Vec<Movie> = movies
        .into_iter()
        .filter(|m| feature_build.store.contains(m.id))
        .collect();
    let resolver = QueryResolver::new(accepted.iter(), config.fuzzy_threshold);
    let catalog = MovieCatalog::from_records(accepted, ratings);

    let (movie_count, rating_count) = catalog.counts();
    info!(
        "Snapshot built: {} movies, {} ratings, {} matrix columns, {} rejected records",
        movie_count,
        rating_count,
        matrix.column_count(),
        rejected.len()
    );

    Ok(EngineSnapshot {
        catalog: Arc::new(catalog),
        features: Arc::new(feature_build.store),
        matrix: Arc::new(matrix),
        resolver: Arc::new(resolver),
        config,
        rejected: rejected
            .into_iter()
            .map(|(id, err)| (id, err.to_string()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            alternate_titles: vec![],
            language: "en".to_string(),
            year: Some(2000),
            genres: vec!["Drama".to_string()],
            keywords: vec![],
            overview: format!("{} overview", title),
            director: String::new(),
            actors: vec![],
            production_companies: vec![],
            popularity: 1.0,
            vote_average: 6.0,
            vote_count: 10,
            sentiment_rating: None,
        }
    }

    fn broken_movie(id: MovieId) -> Movie {
        let mut movie = test_movie(id, "Broken");
        movie.language = "!!".to_string();
        movie
    }

    #[test]
    fn test_build_succeeds_on_clean_input() {
        let movies = vec![test_movie(1, "One"), test_movie(2, "Two")];
        let snapshot =
            build_snapshot(movies, vec![], EngineConfig::default(), &CancelToken::new()).unwrap();
        assert_eq!(snapshot.features.len(), 2);
        assert_eq!(snapshot.matrix.column_count(), 0);
        assert!(snapshot.rejected.is_empty());
        assert!(snapshot.catalog.contains(1));
    }

    #[test]
    fn test_rejected_movies_are_excluded_and_recorded() {
        let movies = vec![
            test_movie(1, "One"),
            test_movie(2, "Two"),
            test_movie(3, "Three"),
            test_movie(4, "Four"),
            broken_movie(5),
        ];
        let snapshot =
            build_snapshot(movies, vec![], EngineConfig::default(), &CancelToken::new()).unwrap();
        assert_eq!(snapshot.features.len(), 4);
        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected[0].0, 5);
        assert!(!snapshot.catalog.contains(5));
        // Rejected movies are not resolvable either
        assert!(snapshot.resolver.resolve("Broken").is_err());
    }

    #[test]
    fn test_reject_ceiling_fails_whole_build() {
        let movies = vec![test_movie(1, "One"), broken_movie(2), broken_movie(3)];
        let result = build_snapshot(movies, vec![], EngineConfig::default(), &CancelToken::new());
        assert!(matches!(result, Err(BuildError::TooManyRejects { .. })));
    }

    #[test]
    fn test_invalid_group_weights_fail_before_building() {
        let config = EngineConfig {
            group_weights: GroupWeights {
                genres: 0.9,
                ..GroupWeights::default()
            },
            ..EngineConfig::default()
        };
        let result = build_snapshot(
            vec![test_movie(1, "One")],
            vec![],
            config,
            &CancelToken::new(),
        );
        assert!(matches!(
            result,
            Err(BuildError::Similarity(SimilarityError::InvalidWeights { .. }))
        ));
    }

    #[test]
    fn test_cancelled_token_aborts_build() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = build_snapshot(
            vec![test_movie(1, "One")],
            vec![],
            EngineConfig::default(),
            &cancel,
        );
        assert!(matches!(result, Err(BuildError::Cancelled)));
    }
}
