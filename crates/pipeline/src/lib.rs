//! Request-time stages of the hybrid recommendation pipeline.
//!
//! This crate provides the pure stages that sit around the two similarity
//! engines at query time:
//! - [`resolver`]: free-text multilingual query → canonical movie id
//! - [`normalize`]: min-max rescaling local to each engine's candidate pool
//! - [`fusion`]: weighted combination into one ranked list
//!
//! ## Architecture
//! The full query path is a flat pure-function pipeline over published
//! read-only state:
//! 1. Resolve the query to a movie id
//! 2. Gather raw scores from the content and collaborative engines
//! 3. Normalize each pool to [0, 1] independently
//! 4. Fuse with configurable weights and rank
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{fusion, normalize, QueryResolver};
//!
//! let resolver = QueryResolver::new(catalog.movies(), 0.6);
//! let resolved = resolver.resolve("阿凡达")?;
//!
//! let content = normalize::normalize(&content_scores);
//! let collaborative = normalize::normalize(&collab_scores);
//! let ranked = fusion::fuse(&content, &collaborative, weights, top_k)?;
//! ```

pub mod error;
pub mod fusion;
pub mod normalize;
pub mod resolver;

// Re-export main types
pub use error::{QueryError, Result};
pub use fusion::{fuse, HybridWeights, Recommendation};
pub use normalize::normalize;
pub use resolver::{QueryResolver, ResolvedQuery, DEFAULT_FUZZY_THRESHOLD};
