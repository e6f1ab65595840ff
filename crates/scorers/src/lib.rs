//! # Scorers Crate
//!
//! This crate implements the three recipe scoring strategies.
//!
//! ## Components
//!
//! ### Popularity Scorer
//! User-independent ranking by aggregate positive-rating mass.
//! Computed once, then served as a slice.
//!
//! ### Content Scorer
//! TF-IDF over "cook method + ingredients + diet labels":
//! - Each user is the rating-weighted, normalized sum of the vectors they rated
//! - Every recipe is ranked by similarity to that profile
//! - Profiles are memoized in a concurrent map
//!
//! ### Collaborative Scorer
//! Truncated SVD of the user × recipe interaction matrix:
//! - Fitted once per scorer (rank up to 100, seeded)
//! - Predictions cover recipes the user never rated
//!
//! Per-user scorers return an `Outcome`, so an unknown user or a user with no
//! usable history is never confused with an empty ranking.
//!
//! ## Example Usage
//!
//! ```ignore
//! use scorers::{ContentScorer, InteractionMatrix, Outcome, PopularityScorer};
//! use data_loader::Catalog;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::load_from_files("data".as_ref())?);
//!
//! let popularity = PopularityScorer::new(&catalog);
//! let content = ContentScorer::new(catalog.clone());
//!
//! let top = &popularity.rank()[..10];
//! match content.recommend(user_id) {
//!     Outcome::Ranked(candidates) => { /* ... */ }
//!     Outcome::UserNotFound | Outcome::NoSignal => { /* fall back */ }
//! }
//! ```

// Public modules
pub mod types;
pub mod interactions;
pub mod text;
pub mod latent;
pub mod user_context;
pub mod popularity;
pub mod content;
pub mod collaborative;

// Re-export commonly used types
pub use types::{rank_order, CandidateMetadata, Outcome, RankedCandidate, ScorerKind, UserContext};
pub use interactions::InteractionMatrix;
pub use text::{SparseVector, TfidfVectorizer};
pub use latent::{LatentFactors, SvdConfig};
pub use popularity::PopularityScorer;
pub use content::ContentScorer;
pub use collaborative::CollaborativeScorer;
