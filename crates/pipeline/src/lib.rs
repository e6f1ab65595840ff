//! Pipeline for filtering, nutrition constraints and hybrid merging of
//! recipe candidates.
//!
//! This crate provides:
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - NutritionFilter for calorie ceilings and diet-label quotas
//! - The hybrid combiner (inner join of several scorers' rankings)
//!
//! ## Architecture
//! Candidates flow through in stages:
//! 1. A scorer (or the hybrid combiner) produces a ranked list
//! 2. Filters remove unwanted candidates (already rated, excluded)
//! 3. NutritionFilter applies the calorie ceiling and optional quotas,
//!    truncates, and resolves recipe details
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, NutritionFilter, NutritionPolicy};
//! use pipeline::filters::*;
//!
//! let pipeline = FilterPipeline::new()
//!     .add_filter(AlreadyRatedFilter)
//!     .add_filter(ExcludeRecipesFilter::new(ignored));
//! let candidates = pipeline.apply(ranked, &context)?;
//!
//! let nutrition = NutritionFilter::new(catalog.clone());
//! let recommendations = nutrition.apply(candidates, Some(600.0), 10, NutritionPolicy::quota())?;
//! ```

pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod nutrition;
pub mod hybrid;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use nutrition::{NutritionError, NutritionFilter, NutritionPolicy, Recommendation};
pub use hybrid::{combine, join, HybridCombiner};
