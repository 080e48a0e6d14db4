//! Common types produced by the similarity signal sources.

use data_loader::MovieId;
use serde::{Deserialize, Serialize};

/// Which engine produced a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreOrigin {
    Content,
    Collaborative,
}

/// A raw similarity score between a source movie and one candidate.
///
/// Transient: computed per request and discarded after the response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub source: MovieId,
    pub candidate: MovieId,
    /// Raw score in [0, 1]; higher is more similar.
    pub score: f32,
    pub origin: ScoreOrigin,
}

impl SimilarityScore {
    pub fn new(source: MovieId, candidate: MovieId, score: f32, origin: ScoreOrigin) -> Self {
        Self {
            source,
            candidate,
            score,
            origin,
        }
    }
}

/// Sort scores descending with ties broken by candidate id ascending, for
/// reproducible output.
pub fn sort_scores_desc(scores: &mut [SimilarityScore]) {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
}
