//! Filter to remove an explicit list of recipes.
//!
//! Callers use it to hide recipes regardless of who is asking
//! (already served, out of stock, flagged).

use crate::traits::Filter;
use anyhow::Result;
use data_loader::RecipeId;
use scorers::{RankedCandidate, UserContext};
use std::collections::HashSet;

/// Removes candidates whose recipe id is in a fixed ignore set.
pub struct ExcludeRecipesFilter {
    excluded: HashSet<RecipeId>,
}

impl ExcludeRecipesFilter {
    pub fn new(excluded: impl IntoIterator<Item = RecipeId>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }
}

impl Filter for ExcludeRecipesFilter {
    fn name(&self) -> &str {
        "ExcludeRecipesFilter"
    }

    fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        _context: &UserContext,
    ) -> Result<Vec<RankedCandidate>> {
        if self.excluded.is_empty() {
            return Ok(candidates);
        }
        Ok(candidates
            .into_iter()
            .filter(|candidate| !self.excluded.contains(&candidate.recipe_id))
            .collect())
    }
}
