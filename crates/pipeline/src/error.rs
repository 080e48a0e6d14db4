//! Error types for the query pipeline.

use data_loader::MovieId;
use sources::SimilarityError;
use thiserror::Error;

/// Errors raised while resolving and answering a recommendation query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// No registered title cleared the fuzzy-match threshold
    #[error("No movie matched query {query:?} (best fuzzy score {best_score:.2})")]
    NoMatch { query: String, best_score: f64 },

    /// Several movies matched the query too closely to pick one
    #[error("Query {query:?} is ambiguous between {} candidates", candidates.len())]
    Ambiguous {
        query: String,
        /// `(movie id, match score)` for every near-tied candidate.
        candidates: Vec<(MovieId, f64)>,
    },

    /// An engine-level failure surfaced through the pipeline
    #[error(transparent)]
    Similarity(#[from] SimilarityError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, QueryError>;
