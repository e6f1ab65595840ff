//! Popularity Scorer - User-independent ranking
//!
//! Ranks recipes by their aggregate positive-rating mass:
//! 1. Keep interaction events with rating strictly above the threshold (default 3.0)
//! 2. Sum the kept ratings per recipe
//! 3. Sort by sum descending, ties by recipe id ascending
//!
//! Ratings at or below the threshold are ignored, not counted as negative evidence.
//! The ranking is computed once at construction.

use crate::types::{rank_order, RankedCandidate, ScorerKind};
use data_loader::{Catalog, RecipeId};
use std::collections::HashMap;
use tracing::debug;

/// Default positive-signal threshold
pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 3.0;

/// Precomputed popularity ranking
#[derive(Debug, Clone)]
pub struct PopularityScorer {
    threshold: f64,
    ranking: Vec<RankedCandidate>,
}

impl PopularityScorer {
    /// Rank the catalog with the default threshold
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_threshold(catalog, DEFAULT_POSITIVE_THRESHOLD)
    }

    /// Rank the catalog counting only ratings strictly above `threshold`
    pub fn with_threshold(catalog: &Catalog, threshold: f64) -> Self {
        let mut totals: HashMap<RecipeId, f64> = HashMap::new();
        for interaction in catalog.interactions() {
            if interaction.rating > threshold {
                *totals.entry(interaction.recipe_id).or_insert(0.0) += interaction.rating;
            }
        }

        let mut ranking: Vec<RankedCandidate> = totals
            .into_iter()
            .map(|(recipe_id, total)| RankedCandidate::new(recipe_id, ScorerKind::Popularity, total))
            .collect();
        ranking.sort_by(rank_order);

        debug!(
            "Popularity ranking built: {} recipes above threshold {}",
            ranking.len(),
            threshold
        );

        Self { threshold, ranking }
    }

    pub fn name(&self) -> &'static str {
        ScorerKind::Popularity.name()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The full ranking; empty when no event clears the threshold
    pub fn rank(&self) -> &[RankedCandidate] {
        &self.ranking
    }
}
