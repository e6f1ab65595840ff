//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod already_rated;
pub mod calorie_ceiling;
pub mod diet_quota;
pub mod exclude;

// Re-export for convenience
pub use already_rated::AlreadyRatedFilter;
pub use calorie_ceiling::CalorieCeilingFilter;
pub use diet_quota::DietQuotaFilter;
pub use exclude::ExcludeRecipesFilter;
