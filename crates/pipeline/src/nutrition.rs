//! Nutrition post-processing shared by every scorer.
//!
//! `NutritionFilter` turns a ranked candidate list into displayable
//! recommendations under a calorie ceiling, optionally enforcing per-label
//! quotas. It is a fixed composition of filters:
//!
//! - Simple: `CalorieCeilingFilter` → first `top_n`
//! - Quota: `CalorieCeilingFilter` → `DietQuotaFilter` → first `top_n`
//!
//! With no ceiling the quota step is skipped and the first `top_n` known
//! recipes pass through unchanged.

use crate::filter_pipeline::FilterPipeline;
use crate::filters::{CalorieCeilingFilter, DietQuotaFilter};
use crate::filters::diet_quota::DEFAULT_PER_LABEL;
use data_loader::{Catalog, RecipeId};
use scorers::{RankedCandidate, ScorerKind, UserContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised before any filtering happens
#[derive(Error, Debug)]
pub enum NutritionError {
    /// Ceiling is negative, NaN or infinite
    #[error("Invalid calorie ceiling {0}: must be a finite, non-negative number")]
    InvalidCalorieCeiling(f64),

    /// A filter in the nutrition pipeline failed
    #[error("Nutrition filter failed: {0}")]
    Filter(#[from] anyhow::Error),
}

/// How the filtered list is trimmed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutritionPolicy {
    /// Calorie filter, then keep the first `top_n`
    #[default]
    Simple,
    /// Calorie filter, then at most `per_label` recipes per diet label
    Quota { per_label: usize },
}

impl NutritionPolicy {
    /// Quota policy with the default of 2 per label
    pub fn quota() -> Self {
        NutritionPolicy::Quota {
            per_label: DEFAULT_PER_LABEL,
        }
    }
}

/// A recipe ready to show to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recipe_id: RecipeId,
    pub name: String,
    pub calories: f64,
    pub diet_labels: Vec<String>,
    pub score: f64,
    pub provenance: ScorerKind,
}

/// Reject ceilings that are negative or not finite
pub fn validate_ceiling(calorie_ceiling: Option<f64>) -> Result<(), NutritionError> {
    match calorie_ceiling {
        Some(ceiling) if !ceiling.is_finite() || ceiling < 0.0 => {
            Err(NutritionError::InvalidCalorieCeiling(ceiling))
        }
        _ => Ok(()),
    }
}

/// Calorie and diet-label post-processing over the catalog
pub struct NutritionFilter {
    catalog: Arc<Catalog>,
}

impl NutritionFilter {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Filter `candidates` under an explicit ceiling.
    ///
    /// The incoming order is taken as the rank order.
    pub fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        calorie_ceiling: Option<f64>,
        top_n: usize,
        policy: NutritionPolicy,
    ) -> Result<Vec<Recommendation>, NutritionError> {
        let mut context = UserContext::default();
        context.calorie_ceiling = calorie_ceiling;
        self.apply_for(candidates, &context, top_n, policy)
    }

    /// Filter `candidates` under the ceiling carried by `context`
    #[instrument(skip(self, candidates, context), fields(user_id = context.user_id, count = candidates.len()))]
    pub fn apply_for(
        &self,
        candidates: Vec<RankedCandidate>,
        context: &UserContext,
        top_n: usize,
        policy: NutritionPolicy,
    ) -> Result<Vec<Recommendation>, NutritionError> {
        validate_ceiling(context.calorie_ceiling)?;

        let mut pipeline = FilterPipeline::new().add_filter(CalorieCeilingFilter::new(self.catalog.clone()));
        if let (Some(_), NutritionPolicy::Quota { per_label }) = (context.calorie_ceiling, policy) {
            pipeline = pipeline
                .add_filter(DietQuotaFilter::new(self.catalog.clone()).with_per_label(per_label));
        }

        let mut filtered = pipeline.apply(candidates, context)?;
        filtered.truncate(top_n);
        debug!("{} recommendations after nutrition filtering", filtered.len());

        Ok(filtered
            .into_iter()
            .filter_map(|candidate| self.to_recommendation(candidate))
            .collect())
    }

    fn to_recommendation(&self, candidate: RankedCandidate) -> Option<Recommendation> {
        let recipe = self.catalog.get_recipe(candidate.recipe_id)?;
        Some(Recommendation {
            recipe_id: recipe.id,
            name: recipe.name.clone(),
            calories: recipe.calories,
            diet_labels: recipe.diet_labels.clone(),
            score: candidate.score,
            provenance: candidate.provenance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DietLabel, Recipe};
    use std::collections::HashSet;

    fn create_test_catalog() -> Arc<Catalog> {
        let recipes: [(u32, f64, &str); 9] = [
            (1, 200.0, "balanced"),
            (2, 400.0, "highprotein"),
            (3, 150.0, "balanced lowfat"),
            (4, 280.0, "balanced"),
            (5, 250.0, "balanced highfiber"),
            (6, 120.0, "lowsodium lowfat"),
            (7, 310.0, "lowcarb"),
            (8, 90.0, "lowfat"),
            (9, 60.0, "highfiber lowcarb"),
        ];
        let mut catalog = Catalog::new();
        for (id, calories, labels) in recipes {
            catalog.insert_recipe(Recipe {
                id,
                name: format!("Recipe {}", id),
                ingredients: String::new(),
                cook_method: String::new(),
                diet_labels: labels.split_whitespace().map(|s| s.to_string()).collect(),
                calories,
            });
        }
        Arc::new(catalog)
    }

    fn ranked(ids: &[u32]) -> Vec<RankedCandidate> {
        ids.iter()
            .enumerate()
            .map(|(rank, &id)| RankedCandidate::new(id, ScorerKind::Popularity, 100.0 - rank as f64))
            .collect()
    }

    fn ids(recs: &[Recommendation]) -> Vec<u32> {
        recs.iter().map(|r| r.recipe_id).collect()
    }

    #[test]
    fn test_simple_policy() {
        let filter = NutritionFilter::new(create_test_catalog());
        let recs = filter
            .apply(ranked(&[2, 1, 7, 3, 4]), Some(300.0), 2, NutritionPolicy::Simple)
            .unwrap();

        assert_eq!(ids(&recs), vec![1, 3]);
        assert_eq!(recs[0].name, "Recipe 1");
        assert_eq!(recs[0].score, 99.0);
    }

    #[test]
    fn test_no_ceiling_passes_through() {
        let filter = NutritionFilter::new(create_test_catalog());
        let recs = filter
            .apply(ranked(&[2, 7, 1, 4]), None, 3, NutritionPolicy::quota())
            .unwrap();
        assert_eq!(ids(&recs), vec![2, 7, 1]);
    }

    #[test]
    fn test_invalid_ceiling_rejected() {
        let filter = NutritionFilter::new(create_test_catalog());
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = filter
                .apply(ranked(&[1]), Some(bad), 5, NutritionPolicy::Simple)
                .unwrap_err();
            assert!(matches!(err, NutritionError::InvalidCalorieCeiling(_)));
        }
    }

    #[test]
    fn test_zero_ceiling_is_valid() {
        let filter = NutritionFilter::new(create_test_catalog());
        let recs = filter
            .apply(ranked(&[1, 2]), Some(0.0), 5, NutritionPolicy::Simple)
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_unknown_recipes_dropped() {
        let filter = NutritionFilter::new(create_test_catalog());
        let recs = filter
            .apply(ranked(&[404, 1]), None, 5, NutritionPolicy::Simple)
            .unwrap();
        assert_eq!(ids(&recs), vec![1]);
    }

    #[test]
    fn test_quota_policy_properties() {
        let catalog = create_test_catalog();
        let filter = NutritionFilter::new(catalog.clone());
        let ceiling = 300.0;
        let input = [1, 2, 3, 4, 5, 6, 7, 8, 9];

        let recs = filter
            .apply(ranked(&input), Some(ceiling), 100, NutritionPolicy::quota())
            .unwrap();

        // No duplicates
        let unique: HashSet<u32> = ids(&recs).into_iter().collect();
        assert_eq!(unique.len(), recs.len());

        // Within the ceiling
        assert!(recs.iter().all(|r| r.calories <= ceiling));

        // Every kept recipe is among the first two survivors of one of its labels
        let survivors: Vec<u32> = input
            .iter()
            .copied()
            .filter(|&id| catalog.get_recipe(id).unwrap().calories <= ceiling)
            .collect();
        for rec in &recs {
            let picked_by_some_label = DietLabel::ALL.iter().any(|label| {
                survivors
                    .iter()
                    .filter(|&&id| catalog.get_recipe(id).unwrap().has_label(label.as_str()))
                    .take(2)
                    .any(|&id| id == rec.recipe_id)
            });
            assert!(picked_by_some_label, "recipe {} exceeds its quota", rec.recipe_id);
        }
        assert_eq!(ids(&recs), vec![1, 3, 5, 6, 9]);

        // Original rank order is preserved
        let positions: Vec<usize> = ids(&recs)
            .iter()
            .map(|id| input.iter().position(|x| x == id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_quota_then_truncate() {
        let filter = NutritionFilter::new(create_test_catalog());
        let recs = filter
            .apply(ranked(&[1, 3, 4, 5, 6]), Some(300.0), 2, NutritionPolicy::quota())
            .unwrap();
        assert_eq!(ids(&recs), vec![1, 3]);
    }
}
