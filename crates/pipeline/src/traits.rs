//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to ranked candidate lists.

use anyhow::Result;
use scorers::{RankedCandidate, UserContext};

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// Filters take ownership of the ranked list and return the survivors in
/// their original relative order.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a ranked list.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - User context with history and calorie ceiling
    fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        context: &UserContext,
    ) -> Result<Vec<RankedCandidate>>;
}
