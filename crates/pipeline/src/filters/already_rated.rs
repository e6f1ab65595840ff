//! Filter to remove recipes the user has already rated.

use crate::traits::Filter;
use anyhow::Result;
use scorers::{RankedCandidate, UserContext};

/// Removes candidates that the user has already rated.
///
/// Uses the HashSet in `UserContext::rated_recipes` for O(1) lookups.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<RankedCandidate>,
        context: &UserContext,
    ) -> Result<Vec<RankedCandidate>> {
        let filtered: Vec<RankedCandidate> = candidates
            .into_iter()
            .filter(|candidate| !context.rated_recipes.contains(&candidate.recipe_id))
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorers::ScorerKind;

    #[test]
    fn test_already_rated_filter() {
        let mut context = UserContext::new(1);
        context.rated_recipes.insert(100);
        context.rated_recipes.insert(200);

        let candidates = vec![
            RankedCandidate::new(100, ScorerKind::Collaborative, 0.9),
            RankedCandidate::new(101, ScorerKind::Collaborative, 0.8),
            RankedCandidate::new(200, ScorerKind::Collaborative, 0.7),
            RankedCandidate::new(300, ScorerKind::Collaborative, 0.6),
        ];

        let filtered = AlreadyRatedFilter.apply(candidates, &context).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].recipe_id, 101);
        assert_eq!(filtered[1].recipe_id, 300);
    }
}
