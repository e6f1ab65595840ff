//! Filter to cap how many recipes each diet label contributes.
//!
//! ## Algorithm
//! 1. For each quota label (balanced, highprotein, highfiber, lowcarb,
//!    lowfat, lowsodium), take the first `per_label` candidates carrying it
//! 2. Union the picks; a recipe in several buckets is kept once
//! 3. Return the union in original rank order
//!
//! Candidates with none of the quota labels are dropped.

use crate::traits::Filter;
use anyhow::Result;
use data_loader::{Catalog, DietLabel};
use scorers::{RankedCandidate, UserContext};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Default number of recipes each label may contribute
pub const DEFAULT_PER_LABEL: usize = 2;

pub struct DietQuotaFilter {
    catalog: Arc<Catalog>,
    per_label: usize,
}

impl DietQuotaFilter {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            per_label: DEFAULT_PER_LABEL,
        }
    }

    /// Configure the per-label quota (default: 2)
    pub fn with_per_label(mut self, per_label: usize) -> Self {
        self.per_label = per_label;
        self
    }
}

impl Filter for DietQuotaFilter {
    fn name(&self) -> &str {
        "DietQuotaFilter"
    }

    fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        _context: &UserContext,
    ) -> Result<Vec<RankedCandidate>> {
        let mut picked: BTreeSet<usize> = BTreeSet::new();

        for label in DietLabel::ALL {
            let bucket = candidates
                .iter()
                .enumerate()
                .filter(|(_, candidate)| {
                    self.catalog
                        .get_recipe(candidate.recipe_id)
                        .is_some_and(|recipe| recipe.has_label(label.as_str()))
                })
                .take(self.per_label)
                .map(|(pos, _)| pos);
            picked.extend(bucket);
        }

        let mut seen = std::collections::HashSet::new();
        let filtered: Vec<RankedCandidate> = candidates
            .into_iter()
            .enumerate()
            .filter(|(pos, candidate)| picked.contains(pos) && seen.insert(candidate.recipe_id))
            .map(|(_, candidate)| candidate)
            .collect();
        Ok(filtered)
    }
}
