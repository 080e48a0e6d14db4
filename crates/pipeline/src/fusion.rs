//! Hybrid fusion: weighted combination of the two normalized score pools
//! into one ranked recommendation list.
//!
//! A movie may appear in only one engine's pool; the absent side counts as
//! 0 so single-source candidates still surface, proportionally discounted.

use crate::error::Result;
use data_loader::MovieId;
use serde::{Deserialize, Serialize};
use sources::SimilarityError;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tolerance for weight-sum validation.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Relative weight of the two signal sources. Defaults favor the
/// collaborative signal, which carries more personalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HybridWeights {
    pub content: f32,
    pub collaborative: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            content: 0.30,
            collaborative: 0.70,
        }
    }
}

impl HybridWeights {
    pub fn new(content: f32, collaborative: f32) -> Self {
        Self {
            content,
            collaborative,
        }
    }

    /// Weights must be non-negative and sum to 1.0.
    pub fn validate(&self) -> std::result::Result<(), SimilarityError> {
        let sum = self.content + self.collaborative;
        if self.content < 0.0 || self.collaborative < 0.0 || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE
        {
            return Err(SimilarityError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// One fused recommendation. Output-only; never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    /// Normalized content score, absent when the content engine did not
    /// return this candidate.
    pub content_score: Option<f32>,
    /// Normalized collaborative score, absent when the collaborative
    /// engine did not return this candidate.
    pub collaborative_score: Option<f32>,
    pub fused_score: f32,
    /// 1-based position in the ranked output.
    pub rank: usize,
}

/// Fuse the two normalized pools and return the top `top_k` entries.
///
/// Sorted descending by fused score; ties broken by movie id ascending for
/// reproducibility.
pub fn fuse(
    content: &HashMap<MovieId, f32>,
    collaborative: &HashMap<MovieId, f32>,
    weights: HybridWeights,
    top_k: usize,
) -> Result<Vec<Recommendation>> {
    weights.validate()?;

    let all_movies: HashSet<MovieId> = content.keys().chain(collaborative.keys()).copied().collect();

    let mut fused: Vec<Recommendation> = all_movies
        .into_iter()
        .map(|movie_id| {
            let content_score = content.get(&movie_id).copied();
            let collaborative_score = collaborative.get(&movie_id).copied();
            let fused_score = weights.content * content_score.unwrap_or(0.0)
                + weights.collaborative * collaborative_score.unwrap_or(0.0);
            Recommendation {
                movie_id,
                content_score,
                collaborative_score,
                fused_score,
                rank: 0,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    fused.truncate(top_k);
    for (i, rec) in fused.iter_mut().enumerate() {
        rec.rank = i + 1;
    }

    debug!("Fused {} recommendations", fused.len());
    Ok(fused)
}
