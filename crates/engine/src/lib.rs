//! Engine crate for the diet recipe recommender.
//!
//! `RecommendationEngine` is built once from a catalog snapshot and then
//! serves popularity, content, collaborative and hybrid requests, each
//! finished by the nutrition filter.
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{EngineConfig, RecommendationEngine, RecommendationRequest};
//! use scorers::{Outcome, ScorerKind};
//!
//! let engine = RecommendationEngine::new(catalog, EngineConfig::default())?;
//! let request = RecommendationRequest::new(ScorerKind::Hybrid, 10).for_user(42);
//!
//! match engine.recommend(&request)? {
//!     Outcome::Ranked(recs) => { /* show recs */ }
//!     Outcome::UserNotFound => { /* unknown id */ }
//!     Outcome::NoSignal => { /* not enough history */ }
//! }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod snapshot;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use orchestrator::{RecommendationEngine, RecommendationRequest};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
