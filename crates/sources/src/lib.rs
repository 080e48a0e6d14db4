//! # Sources Crate
//!
//! The two similarity signal sources of the hybrid engine and everything
//! they are built from.
//!
//! ## Components
//!
//! ### Content side
//! - [`tokenize`]: language-aware tokenization strategies, chosen once per
//!   record from its language tag
//! - [`features`]: TF-IDF vectorization per attribute group plus min-max
//!   scaled numeric attributes, published as an immutable `FeatureStore`
//! - [`content`]: weighted multi-attribute cosine similarity
//!
//! ### Collaborative side
//! - [`matrix`]: sparse user-movie interaction matrix with a
//!   minimum-ratings quality gate
//! - [`collaborative`]: brute-force cosine k-nearest-neighbor retrieval
//!
//! Both engines share [`types::SimilarityScore`] as their output and are
//! read-only after construction, so concurrent queries need no locking.

pub mod collaborative;
pub mod content;
pub mod error;
pub mod features;
pub mod matrix;
pub mod tokenize;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use collaborative::CollaborativeSimilarityEngine;
pub use content::ContentSimilarityEngine;
pub use error::{ColdStartReason, SimilarityError};
pub use features::{
    AttributeGroup, FeatureBuild, FeatureBuilder, FeatureStore, FeatureVector, GroupWeights,
    NumericAttribute,
};
pub use matrix::{InteractionMatrix, InteractionMatrixBuilder};
pub use types::{ScoreOrigin, SimilarityScore};
