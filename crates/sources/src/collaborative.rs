//! Collaborative similarity: nearest-neighbor retrieval over the sparse
//! interaction matrix.
//!
//! ## Algorithm
//! 1. Look up the queried movie's column; a movie without a column was
//!    dropped by the minimum-ratings gate and is a cold start
//! 2. Brute-force cosine against every other column in parallel
//! 3. Keep columns with at least one overlapping rater; if none overlap,
//!    that is the other cold-start case and is reported as such
//! 4. Sort descending, tie-break by movie id, truncate to k
//!
//! Raw score = 1 - cosine distance = cosine similarity, in [0, 1] because
//! rating vectors are non-negative.

use crate::error::{ColdStartReason, Result, SimilarityError};
use crate::matrix::InteractionMatrix;
use crate::types::{sort_scores_desc, ScoreOrigin, SimilarityScore};
use data_loader::MovieId;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Nearest-neighbor retrieval over a published interaction matrix.
#[derive(Clone)]
pub struct CollaborativeSimilarityEngine {
    matrix: Arc<InteractionMatrix>,
}

impl CollaborativeSimilarityEngine {
    pub fn new(matrix: Arc<InteractionMatrix>) -> Self {
        Self { matrix }
    }

    /// The k nearest columns to `movie_id` by cosine distance.
    ///
    /// `k` is a required argument; this engine carries no hidden default.
    ///
    /// # Errors
    /// * `ColdStart { BelowRatingThreshold }` - the movie has no column
    /// * `ColdStart { NoOverlappingRaters }` - no other column shares a rater
    #[instrument(skip(self))]
    pub fn nearest_neighbors(&self, movie_id: MovieId, k: usize) -> Result<Vec<SimilarityScore>> {
        let query = self
            .matrix
            .column(movie_id)
            .ok_or(SimilarityError::ColdStart {
                id: movie_id,
                reason: ColdStartReason::BelowRatingThreshold,
            })?;

        let mut scores: Vec<SimilarityScore> = self
            .matrix
            .columns()
            .par_iter()
            .filter(|candidate| candidate.movie_id != movie_id)
            .filter(|candidate| query.overlaps(candidate))
            .map(|candidate| {
                SimilarityScore::new(
                    movie_id,
                    candidate.movie_id,
                    query.cosine(candidate).clamp(0.0, 1.0),
                    ScoreOrigin::Collaborative,
                )
            })
            .collect();

        if scores.is_empty() {
            return Err(SimilarityError::ColdStart {
                id: movie_id,
                reason: ColdStartReason::NoOverlappingRaters,
            });
        }

        sort_scores_desc(&mut scores);
        scores.truncate(k);
        debug!(
            "Found {} collaborative neighbors for movie {}",
            scores.len(),
            movie_id
        );
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::InteractionMatrixBuilder;
    use crate::testutil::rating;

    /// Three movies rated by overlapping users; movie 4 rated by a loner.
    fn build_matrix(min_ratings: u32) -> InteractionMatrix {
        let ratings = vec![
            // users 1-3 rate movie 1
            rating(1, 1, 5.0),
            rating(2, 1, 4.0),
            rating(3, 1, 4.5),
            // users 1-3 rate movie 2 similarly
            rating(1, 2, 5.0),
            rating(2, 2, 4.0),
            rating(3, 2, 4.0),
            // users 2-3 rate movie 3 differently
            rating(2, 3, 1.0),
            rating(3, 3, 2.0),
            // movie 4 rated only by user 9
            rating(9, 4, 5.0),
        ];
        InteractionMatrixBuilder::new(min_ratings).build(&ratings)
    }

    #[test]
    fn test_neighbors_sorted_and_bounded() {
        let engine = CollaborativeSimilarityEngine::new(Arc::new(build_matrix(1)));
        let neighbors = engine.nearest_neighbors(1, 10).unwrap();

        assert!(!neighbors.is_empty());
        for pair in neighbors.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for n in &neighbors {
            assert!((0.0..=1.0).contains(&n.score));
            assert_ne!(n.candidate, 1);
        }
        // Movie 2 has the most similar rating pattern
        assert_eq!(neighbors[0].candidate, 2);
    }

    #[test]
    fn test_k_truncates_result() {
        let engine = CollaborativeSimilarityEngine::new(Arc::new(build_matrix(1)));
        let neighbors = engine.nearest_neighbors(1, 1).unwrap();
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn test_filtered_movie_is_cold_start() {
        // Threshold 2 drops movie 4 (one rating)
        let engine = CollaborativeSimilarityEngine::new(Arc::new(build_matrix(2)));
        let err = engine.nearest_neighbors(4, 5).unwrap_err();
        assert!(matches!(
            err,
            SimilarityError::ColdStart {
                id: 4,
                reason: ColdStartReason::BelowRatingThreshold,
            }
        ));
    }

    #[test]
    fn test_no_overlapping_raters_is_cold_start() {
        // Threshold 1 keeps movie 4, but user 9 rated nothing else
        let engine = CollaborativeSimilarityEngine::new(Arc::new(build_matrix(1)));
        let err = engine.nearest_neighbors(4, 5).unwrap_err();
        assert!(matches!(
            err,
            SimilarityError::ColdStart {
                id: 4,
                reason: ColdStartReason::NoOverlappingRaters,
            }
        ));
    }

    #[test]
    fn test_empty_matrix_is_cold_start_for_everything() {
        let matrix = InteractionMatrixBuilder::new(10).build(&[]);
        let engine = CollaborativeSimilarityEngine::new(Arc::new(matrix));
        assert!(matches!(
            engine.nearest_neighbors(1, 5),
            Err(SimilarityError::ColdStart { .. })
        ));
    }
}
