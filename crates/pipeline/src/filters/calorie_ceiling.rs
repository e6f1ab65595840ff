//! Filter to enforce the per-meal calorie ceiling.
//!
//! Also drops candidates whose recipe is not in the catalog, so every
//! survivor can be turned into a displayable recommendation.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::Catalog;
use scorers::{RankedCandidate, UserContext};
use std::sync::Arc;

/// Removes candidates above `UserContext::calorie_ceiling`.
///
/// With no ceiling, only unknown recipes are removed.
pub struct CalorieCeilingFilter {
    catalog: Arc<Catalog>,
}

impl CalorieCeilingFilter {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl Filter for CalorieCeilingFilter {
    fn name(&self) -> &str {
        "CalorieCeilingFilter"
    }

    fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        context: &UserContext,
    ) -> Result<Vec<RankedCandidate>> {
        let filtered: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter(|candidate| match self.catalog.get_recipe(candidate.recipe_id) {
                Some(recipe) => context
                    .calorie_ceiling
                    .is_none_or(|ceiling| recipe.calories <= ceiling),
                None => {
                    tracing::warn!("Dropping unknown recipe {}", candidate.recipe_id);
                    false
                }
            })
            .collect();
        Ok(filtered)
    }
}
