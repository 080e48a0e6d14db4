//! Score normalization: min-max rescaling local to one candidate pool.
//!
//! Each engine's raw scores are rescaled over the pool actually returned
//! for this request, not the global corpus, so a tight cluster of
//! similarly-scored candidates is still differentiated. A pool with a
//! single member, or where every raw score is equal, normalizes to 1.0 for
//! all entries; that keeps the fallback defined and avoids dividing by the
//! zero span.

use data_loader::MovieId;
use sources::SimilarityScore;
use std::collections::HashMap;

/// Treat raw scores within this distance as equal.
const SCORE_EPSILON: f32 = 1e-6;

/// Rescale one candidate pool to [0, 1].
///
/// Returns a candidate-id → normalized-score map ready for fusion. An
/// empty pool yields an empty map.
pub fn normalize(pool: &[SimilarityScore]) -> HashMap<MovieId, f32> {
    if pool.is_empty() {
        return HashMap::new();
    }

    let min = pool.iter().map(|s| s.score).fold(f32::INFINITY, f32::min);
    let max = pool
        .iter()
        .map(|s| s.score)
        .fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;

    if pool.len() == 1 || span < SCORE_EPSILON {
        return pool.iter().map(|s| (s.candidate, 1.0)).collect();
    }

    pool.iter()
        .map(|s| (s.candidate, ((s.score - min) / span).clamp(0.0, 1.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{ScoreOrigin, SimilarityScore};

    fn score(candidate: MovieId, value: f32) -> SimilarityScore {
        SimilarityScore::new(1, candidate, value, ScoreOrigin::Content)
    }

    #[test]
    fn test_empty_pool() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_single_member_pool_normalizes_to_one() {
        let normalized = normalize(&[score(2, 0.37)]);
        assert_eq!(normalized[&2], 1.0);
    }

    #[test]
    fn test_equal_scores_normalize_to_one() {
        let normalized = normalize(&[score(2, 0.5), score(3, 0.5), score(4, 0.5)]);
        assert!(normalized.values().all(|&v| v == 1.0));
    }

    #[test]
    fn test_min_max_spread() {
        let normalized = normalize(&[score(2, 0.2), score(3, 0.4), score(4, 0.6)]);
        assert_eq!(normalized[&2], 0.0);
        assert!((normalized[&3] - 0.5).abs() < 1e-6);
        assert_eq!(normalized[&4], 1.0);
    }

    #[test]
    fn test_output_within_unit_interval() {
        let normalized = normalize(&[score(2, 0.11), score(3, 0.97), score(4, 0.42)]);
        for v in normalized.values() {
            assert!((0.0..=1.0).contains(v));
        }
    }
}
