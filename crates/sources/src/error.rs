//! Error types shared by the similarity signal sources.

use data_loader::MovieId;
use std::fmt;
use thiserror::Error;

/// Why a movie has no collaborative signal.
///
/// The two cases are deliberately distinct: a movie dropped by the
/// minimum-ratings gate is a different situation from one that made it into
/// the matrix but shares no raters with anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColdStartReason {
    /// The movie had fewer ratings than the minimum-ratings threshold and
    /// was excluded from the interaction matrix.
    BelowRatingThreshold,
    /// The movie has a column but no other column shares a rater with it.
    NoOverlappingRaters,
}

impl fmt::Display for ColdStartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColdStartReason::BelowRatingThreshold => {
                write!(f, "filtered out by the minimum-ratings threshold")
            }
            ColdStartReason::NoOverlappingRaters => {
                write!(f, "no overlapping raters with any other movie")
            }
        }
    }
}

/// Errors raised by feature building and the similarity engines.
#[derive(Error, Debug)]
pub enum SimilarityError {
    /// A movie record failed integrity checks during feature building
    #[error("Movie {id} failed integrity checks: {reason}")]
    DataIntegrity { id: MovieId, reason: String },

    /// The movie id is not present in the active feature set
    #[error("Movie {id} is not present in the active snapshot")]
    UnknownMovie { id: MovieId },

    /// The movie cannot produce collaborative neighbors
    #[error("Movie {id} has no collaborative signal: {reason}")]
    ColdStart {
        id: MovieId,
        reason: ColdStartReason,
    },

    /// A weight set does not sum to 1.0 or contains a negative value
    #[error("Weights must be non-negative and sum to 1.0 (got sum {sum})")]
    InvalidWeights { sum: f32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SimilarityError>;
