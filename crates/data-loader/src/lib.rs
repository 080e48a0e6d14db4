//! Data loading for the hybrid recommendation engine.
//!
//! This crate owns the domain record types and everything needed to get
//! source data into memory:
//! - [`types`]: `Movie`, `RatingEntry`, `Language`, id aliases
//! - [`parser`]: enriched-movie JSON-lines and `::`-delimited ratings files
//! - [`catalog`]: the read-only `MovieCatalog` with lookup indices
//! - [`error`]: `DataLoadError`
//!
//! Movie parsing is partial-failure: malformed records are recorded and
//! excluded, and the build phase decides whether the damage is acceptable.

pub mod catalog;
pub mod error;
pub mod parser;
pub mod types;

// Re-export the types used throughout the workspace
pub use catalog::MovieCatalog;
pub use error::{DataLoadError, Result};
pub use parser::{MovieParseReport, RejectedRecord};
pub use types::{Language, Movie, MovieId, RatingEntry, UserId};
