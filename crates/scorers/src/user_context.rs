//! Helper to build a UserContext from the Catalog
//!
//! The context gathers what the filters need about one user, so the
//! catalog is queried once per request.

use crate::types::UserContext;
use anyhow::{anyhow, bail, Result};
use data_loader::{Catalog, UserId};

/// Default number of meals the daily budget is split across
pub const DEFAULT_MEALS_PER_DAY: u32 = 3;

/// Build a UserContext for a given user
///
/// Aggregates:
/// - Recipes rated (any rating, any number of times)
/// - Average rating given by the user
/// - Daily calorie budget and the per-meal ceiling `budget / meals_per_day`
pub fn build_user_context(
    catalog: &Catalog,
    user_id: UserId,
    meals_per_day: u32,
) -> Result<UserContext> {
    if meals_per_day == 0 {
        bail!("meals_per_day must be at least 1");
    }

    let user = catalog
        .get_user(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    let mut context = UserContext::new(user_id);
    context.calories_per_day = user.calories_per_day;
    context.calorie_ceiling = user
        .calories_per_day
        .map(|budget| budget / meals_per_day as f64);

    let interactions = catalog.get_user_interactions(user_id);
    if interactions.is_empty() {
        return Ok(context);
    }

    let total: f64 = interactions.iter().map(|i| i.rating).sum();
    context.avg_rating = total / interactions.len() as f64;
    context.rated_recipes = interactions.iter().map(|i| i.recipe_id).collect();

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, Recipe, User};

    fn create_test_catalog() -> Catalog {
        let recipes = (1..=3)
            .map(|id| Recipe {
                id,
                name: format!("Recipe {}", id),
                ingredients: "oats".to_string(),
                cook_method: "stir".to_string(),
                diet_labels: vec!["balanced".to_string()],
                calories: 250.0,
            })
            .collect();
        let users = vec![
            User { id: 1, calories_per_day: Some(2100.0) },
            User { id: 2, calories_per_day: None },
        ];
        let interactions = vec![
            Interaction { user_id: 1, recipe_id: 1, rating: 5.0 },
            Interaction { user_id: 1, recipe_id: 2, rating: 3.0 },
            Interaction { user_id: 1, recipe_id: 1, rating: 4.0 },
        ];
        Catalog::from_parts(recipes, users, interactions).unwrap()
    }

    #[test]
    fn test_build_user_context_basic() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, 1, DEFAULT_MEALS_PER_DAY).unwrap();

        assert_eq!(context.user_id, 1);
        assert_eq!(context.rated_recipes.len(), 2);
        assert!(context.rated_recipes.contains(&1));
        assert!(context.rated_recipes.contains(&2));
        assert!((context.avg_rating - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_calorie_ceiling_per_meal() {
        let catalog = create_test_catalog();

        let context = build_user_context(&catalog, 1, 3).unwrap();
        assert_eq!(context.calories_per_day, Some(2100.0));
        assert_eq!(context.calorie_ceiling, Some(700.0));

        let context = build_user_context(&catalog, 1, 2).unwrap();
        assert_eq!(context.calorie_ceiling, Some(1050.0));
    }

    #[test]
    fn test_repeat_ratings_in_average_but_not_rated_set() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, 1, DEFAULT_MEALS_PER_DAY).unwrap();

        assert_eq!(catalog.get_user_interactions(1).len(), 3);
        assert_eq!(context.rated_recipes.len(), 2);
        // (5 + 3 + 4) / 3, not the mean of per-recipe averages
        assert!((context.avg_rating - 4.0).abs() < 1e-9);
        assert_eq!(context.calories_per_day, Some(2100.0));
    }

    #[test]
    fn test_user_without_budget_or_history() {
        let catalog = create_test_catalog();
        let context = build_user_context(&catalog, 2, DEFAULT_MEALS_PER_DAY).unwrap();

        assert_eq!(context.calorie_ceiling, None);
        assert!(context.rated_recipes.is_empty());
        assert_eq!(context.avg_rating, 0.0);
    }

    #[test]
    fn test_user_not_found() {
        let catalog = Catalog::new();
        assert!(build_user_context(&catalog, 999, DEFAULT_MEALS_PER_DAY).is_err());
    }

    #[test]
    fn test_zero_meals_rejected() {
        let catalog = create_test_catalog();
        assert!(build_user_context(&catalog, 1, 0).is_err());
    }
}
