//! # Hybrid Recommendation Orchestrator
//!
//! Coordinates the full query pipeline over the active snapshot:
//! 1. Resolve the free-text query to a canonical movie id
//! 2. Run the content and collaborative engines in parallel
//! 3. Normalize each engine's candidate pool to [0, 1]
//! 4. Fuse with the configured weights and rank
//! 5. Enrich the top entries from the catalog
//!
//! Rebuilds publish a new immutable snapshot and swap the active reference
//! atomically; in-flight queries keep the snapshot they started with.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use parking_lot::RwLock;
use tracing::{info, warn};

use data_loader::{Movie, MovieId, RatingEntry, UserId};
use pipeline::{fuse, normalize, HybridWeights, ResolvedQuery};
use sources::{
    ColdStartReason, CollaborativeSimilarityEngine, ContentSimilarityEngine, SimilarityError,
    SimilarityScore,
};

use crate::snapshot::{build_snapshot, BuildError, CancelToken, EngineConfig, EngineSnapshot};

/// Whether a signal source contributed to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStatus {
    Ok,
    /// The source produced nothing, for the stated reason. The response
    /// degrades to the other source instead of failing, but the reason is
    /// always reported.
    ColdStart(ColdStartReason),
}

/// Final recommendation entry returned to the caller.
#[derive(Debug, Clone)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    pub content_score: Option<f32>,
    pub collaborative_score: Option<f32>,
    pub fused_score: f32,
    pub rank: usize,
}

/// A complete answer to one `recommend` call.
#[derive(Debug, Clone)]
pub struct RecommendResponse {
    pub query: String,
    /// Requesting user, when one was identified.
    pub user_id: Option<UserId>,
    /// The movie the query resolved to.
    pub resolved_id: MovieId,
    pub resolved_title: String,
    pub recommendations: Vec<RecommendedMovie>,
    pub collaborative: SignalStatus,
}

/// The engine handle: owns the active snapshot and serves queries against
/// it. Cheap to share; queries only clone an `Arc` out of the lock.
pub struct HybridEngine {
    active: RwLock<Arc<EngineSnapshot>>,
}

impl HybridEngine {
    /// Create an engine around an already-built snapshot.
    pub fn new(snapshot: EngineSnapshot) -> Self {
        Self {
            active: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Build the first snapshot from raw records and wrap it.
    pub fn from_records(
        movies: Vec<Movie>,
        ratings: Vec<RatingEntry>,
        config: EngineConfig,
    ) -> std::result::Result<Self, BuildError> {
        let snapshot = build_snapshot(movies, ratings, config, &CancelToken::new())?;
        Ok(Self::new(snapshot))
    }

    /// The snapshot current at this instant. In-flight callers keep their
    /// clone even if a rebuild swaps the active reference afterward.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.active.read().clone()
    }

    /// Run the full build phase and atomically swap the result in.
    ///
    /// The build runs entirely off-lock; a failed or cancelled rebuild
    /// leaves the previous snapshot active.
    pub fn rebuild(
        &self,
        movies: Vec<Movie>,
        ratings: Vec<RatingEntry>,
        config: EngineConfig,
        cancel: &CancelToken,
    ) -> std::result::Result<(), BuildError> {
        let start = Instant::now();
        let snapshot = build_snapshot(movies, ratings, config, cancel)?;
        *self.active.write() = Arc::new(snapshot);
        info!("Rebuild completed and swapped in {:.2?}", start.elapsed());
        Ok(())
    }

    /// Main entry point: recommendations for a free-text title query.
    ///
    /// # Arguments
    /// * `query` - movie title in any supported language
    /// * `user_id` - requesting user, if known; echoed in the response and
    ///   carried for attribution (both signal sources are item-to-item)
    /// * `top_k` - number of recommendations to return, must be positive
    /// * `weights` - optional per-request override of the fusion weights
    pub async fn recommend(
        &self,
        query: &str,
        user_id: Option<UserId>,
        top_k: usize,
        weights: Option<HybridWeights>,
    ) -> Result<RecommendResponse> {
        ensure!(top_k > 0, "top_k must be a positive integer");
        let start = Instant::now();

        let snapshot = self.snapshot();
        let weights = weights.unwrap_or(snapshot.config.hybrid_weights);
        weights.validate()?;

        let resolved = snapshot.resolver.resolve(query)?;
        info!(
            "Resolved query {:?} (user {:?}) to movie {} ({:?}, score {:.2})",
            query, user_id, resolved.movie_id, resolved.query_language, resolved.match_score
        );

        // Ask each engine for more candidates than we return so fusion has
        // something to reorder
        let pool_size = (top_k * 2).max(snapshot.config.k_neighbors);
        let (content_pool, collab_result) =
            self.gather_scores(&snapshot, &resolved, pool_size).await?;

        // A collaborative cold start degrades the response to content-only
        // but is reported, never swallowed
        let (collab_pool, collab_status) = match collab_result {
            Ok(pool) => (pool, SignalStatus::Ok),
            Err(SimilarityError::ColdStart { id, reason }) => {
                warn!("Collaborative cold start for movie {}: {}", id, reason);
                (Vec::new(), SignalStatus::ColdStart(reason))
            }
            Err(other) => return Err(other.into()),
        };

        let ranked = fuse(
            &normalize(&content_pool),
            &normalize(&collab_pool),
            weights,
            top_k,
        )?;

        let recommendations: Vec<RecommendedMovie> = ranked
            .into_iter()
            .filter_map(|rec| {
                let movie = snapshot.catalog.get_movie(rec.movie_id)?;
                Some(RecommendedMovie {
                    movie_id: rec.movie_id,
                    title: movie.title.clone(),
                    year: movie.year,
                    genres: movie.genres.clone(),
                    content_score: rec.content_score,
                    collaborative_score: rec.collaborative_score,
                    fused_score: rec.fused_score,
                    rank: rec.rank,
                })
            })
            .collect();

        info!(
            "Answered query {:?} with {} recommendations in {:.2?}",
            query,
            recommendations.len(),
            start.elapsed()
        );

        // Report the canonical title, not the (possibly alternate-language,
        // normalized) title the query happened to match
        let resolved_title = snapshot
            .catalog
            .get_movie(resolved.movie_id)
            .map(|m| m.title.clone())
            .unwrap_or(resolved.matched_title);

        Ok(RecommendResponse {
            query: query.to_string(),
            user_id,
            resolved_id: resolved.movie_id,
            resolved_title,
            recommendations,
            collaborative: collab_status,
        })
    }

    /// Run both similarity engines concurrently against the snapshot.
    async fn gather_scores(
        &self,
        snapshot: &Arc<EngineSnapshot>,
        resolved: &ResolvedQuery,
        pool_size: usize,
    ) -> Result<(
        Vec<SimilarityScore>,
        std::result::Result<Vec<SimilarityScore>, SimilarityError>,
    )> {
        let movie_id = resolved.movie_id;
        let k = snapshot.config.k_neighbors.min(pool_size).max(1);

        let content_engine = ContentSimilarityEngine::new(snapshot.features.clone());
        let collab_engine = CollaborativeSimilarityEngine::new(snapshot.matrix.clone());

        let (content_result, collab_result) = tokio::join!(
            tokio::task::spawn_blocking(move || content_engine.similar_to(movie_id, pool_size)),
            tokio::task::spawn_blocking(move || collab_engine.nearest_neighbors(movie_id, k)),
        );

        let content_pool = content_result.context("Content scoring task panicked")??;
        let collab_result = collab_result.context("Collaborative scoring task panicked")?;
        Ok((content_pool, collab_result))
    }
}
