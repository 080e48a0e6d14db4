//! Server crate for the cine-fuse hybrid recommendation engine.
//!
//! Contains the build phase ([`snapshot`]) and the orchestrator
//! ([`orchestrator`]) that coordinates query-time components over the
//! active immutable snapshot.

pub mod orchestrator;
pub mod snapshot;

pub use orchestrator::{HybridEngine, RecommendResponse, RecommendedMovie, SignalStatus};
pub use snapshot::{build_snapshot, BuildError, CancelToken, EngineConfig, EngineSnapshot};
