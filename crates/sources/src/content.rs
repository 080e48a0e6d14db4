//! Content similarity: weighted multi-attribute cosine similarity between
//! feature vectors.
//!
//! ## Algorithm
//! 1. Per text attribute group: cosine similarity of the two L2-normalized
//!    sparse vectors (a plain dot product), multiplied by the group weight
//! 2. Per numeric attribute: closeness `1 - |a - b|` of the min-max scaled
//!    values, multiplied by its share of the numeric weight block
//! 3. Sum of all terms is the raw score, guaranteed in [0, 1] because
//!    inputs are non-negative and weights sum to 1
//!
//! A group with an empty vector on either side contributes 0 for its term;
//! missing data depresses similarity rather than inflating it.

use crate::error::{Result, SimilarityError};
use crate::features::{AttributeGroup, FeatureStore, FeatureVector, NumericAttribute};
use crate::types::{sort_scores_desc, ScoreOrigin, SimilarityScore};
use data_loader::MovieId;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Computes weighted attribute similarity over a published feature store.
#[derive(Clone)]
pub struct ContentSimilarityEngine {
    features: Arc<FeatureStore>,
}

impl ContentSimilarityEngine {
    pub fn new(features: Arc<FeatureStore>) -> Self {
        Self { features }
    }

    /// Weighted similarity between two feature vectors. Symmetric.
    fn score(&self, a: &FeatureVector, b: &FeatureVector) -> f32 {
        let weights = self.features.weights();
        let mut total = 0.0;

        for group in AttributeGroup::ALL {
            let (va, vb) = (a.group(group), b.group(group));
            if va.is_empty() || vb.is_empty() {
                continue; // undefined group contributes 0, not excluded
            }
            total += weights.for_group(group) * va.dot(vb);
        }

        for attribute in NumericAttribute::ALL {
            let diff = (a.numeric(attribute) - b.numeric(attribute)).abs();
            total += weights.numeric * attribute.share() * (1.0 - diff);
        }

        total.clamp(0.0, 1.0)
    }

    /// Similarity between two movies by id.
    pub fn score_pair(&self, a: MovieId, b: MovieId) -> Result<f32> {
        let va = self.vector(a)?;
        let vb = self.vector(b)?;
        Ok(self.score(va, vb))
    }

    /// Score an explicit candidate set against a source movie.
    ///
    /// Candidates without a feature vector are skipped; the source movie
    /// itself is excluded. Output is sorted descending, ties by candidate
    /// id ascending.
    pub fn score_candidates(
        &self,
        source: MovieId,
        candidates: &[MovieId],
    ) -> Result<Vec<SimilarityScore>> {
        let source_vector = self.vector(source)?;

        let mut scores: Vec<SimilarityScore> = candidates
            .par_iter()
            .filter(|&&id| id != source)
            .filter_map(|&id| self.features.get(id))
            .map(|candidate| {
                SimilarityScore::new(
                    source,
                    candidate.movie_id,
                    self.score(source_vector, candidate),
                    ScoreOrigin::Content,
                )
            })
            .collect();

        sort_scores_desc(&mut scores);
        Ok(scores)
    }

    /// The `limit` most content-similar movies to `source`, scanning the
    /// whole corpus.
    #[instrument(skip(self))]
    pub fn similar_to(&self, source: MovieId, limit: usize) -> Result<Vec<SimilarityScore>> {
        let source_vector = self.vector(source)?;

        let mut scores: Vec<SimilarityScore> = self
            .features
            .vectors()
            .par_bridge()
            .filter(|candidate| candidate.movie_id != source)
            .map(|candidate| {
                SimilarityScore::new(
                    source,
                    candidate.movie_id,
                    self.score(source_vector, candidate),
                    ScoreOrigin::Content,
                )
            })
            .collect();

        sort_scores_desc(&mut scores);
        scores.truncate(limit);
        debug!("Scored {} content candidates for movie {}", scores.len(), source);
        Ok(scores)
    }

    fn vector(&self, id: MovieId) -> Result<&FeatureVector> {
        self.features
            .get(id)
            .ok_or(SimilarityError::UnknownMovie { id })
    }
}
