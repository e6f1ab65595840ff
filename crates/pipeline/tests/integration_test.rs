//! Integration tests for the pipeline.
//!
//! These tests verify that scorers, filters, the nutrition layer and the
//! hybrid combiner work together in a realistic scenario.

use data_loader::{Catalog, Interaction, Recipe, User};
use pipeline::filters::*;
use pipeline::{combine, FilterPipeline, NutritionFilter, NutritionPolicy};
use scorers::{user_context::build_user_context, ContentScorer, Outcome, PopularityScorer, ScorerKind};
use std::sync::Arc;

fn recipe(id: u32, name: &str, calories: f64, labels: &str, ingredients: &str) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        ingredients: ingredients.to_string(),
        cook_method: "bake".to_string(),
        diet_labels: labels.split_whitespace().map(|s| s.to_string()).collect(),
        calories,
    }
}

/// Recipes A (200 cal, balanced), B (400 cal, highprotein), C (150 cal, balanced lowfat);
/// user 1 rated A=5, B=2, C=4 and has a 900 calorie daily budget (300 per meal).
fn create_test_setup() -> Arc<Catalog> {
    let recipes = vec![
        recipe(1, "A", 200.0, "balanced", "oats banana"),
        recipe(2, "B", 400.0, "highprotein", "steak butter"),
        recipe(3, "C", 150.0, "balanced lowfat", "spinach banana"),
    ];
    let users = vec![
        User { id: 1, calories_per_day: Some(900.0) },
        User { id: 2, calories_per_day: None },
    ];
    let interactions = vec![
        Interaction { user_id: 1, recipe_id: 1, rating: 5.0 },
        Interaction { user_id: 1, recipe_id: 2, rating: 2.0 },
        Interaction { user_id: 1, recipe_id: 3, rating: 4.0 },
    ];
    Arc::new(Catalog::from_parts(recipes, users, interactions).unwrap())
}

#[test]
fn test_popularity_with_quota_policy() {
    let catalog = create_test_setup();
    let context = build_user_context(&catalog, 1, 3).unwrap();
    assert_eq!(context.calorie_ceiling, Some(300.0));

    let popularity = PopularityScorer::new(&catalog);
    let ids: Vec<u32> = popularity.rank().iter().map(|c| c.recipe_id).collect();
    assert_eq!(ids, vec![1, 3], "B has no rating above 3");

    let nutrition = NutritionFilter::new(catalog.clone());
    let recs = nutrition
        .apply_for(popularity.rank().to_vec(), &context, 10, NutritionPolicy::quota())
        .unwrap();

    let names: Vec<&str> = recs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
    assert!(recs.iter().all(|r| r.provenance == ScorerKind::Popularity));
}

#[test]
fn test_ceiling_drops_b_for_any_scorer() {
    let catalog = create_test_setup();
    let content = ContentScorer::new(catalog.clone());

    let ranked = match content.recommend(1) {
        Outcome::Ranked(candidates) => candidates,
        other => panic!("expected a ranking, got {:?}", other),
    };
    assert_eq!(ranked.len(), 3);

    let recs = NutritionFilter::new(catalog.clone())
        .apply(ranked, Some(300.0), 10, NutritionPolicy::Simple)
        .unwrap();
    assert!(recs.iter().all(|r| r.recipe_id != 2));
    assert_eq!(recs.len(), 2);
}

#[test]
fn test_exclusions_before_nutrition() {
    let catalog = create_test_setup();
    let context = build_user_context(&catalog, 1, 3).unwrap();
    let popularity = PopularityScorer::new(&catalog);

    let pipeline = FilterPipeline::new().add_filter(ExcludeRecipesFilter::new([1]));
    let candidates = pipeline.apply(popularity.rank().to_vec(), &context).unwrap();

    let recs = NutritionFilter::new(catalog.clone())
        .apply_for(candidates, &context, 10, NutritionPolicy::Simple)
        .unwrap();
    let ids: Vec<u32> = recs.iter().map(|r| r.recipe_id).collect();
    assert_eq!(ids, vec![3]);

    // Everything user 1 rated is gone once AlreadyRatedFilter runs
    let rated = FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .apply(popularity.rank().to_vec(), &context)
        .unwrap();
    assert!(rated.is_empty());
}

#[test]
fn test_hybrid_then_nutrition() {
    let catalog = create_test_setup();
    let content = ContentScorer::new(catalog.clone());
    let popularity = PopularityScorer::new(&catalog);

    let content_ranked = content.recommend(1).ranked().unwrap();
    let combined = combine(&[content_ranked, popularity.rank().to_vec()], 10);

    // Only A and C are in both lists
    let mut ids: Vec<u32> = combined.iter().map(|c| c.recipe_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 3]);

    let recs = NutritionFilter::new(catalog.clone())
        .apply(combined, Some(300.0), 10, NutritionPolicy::quota())
        .unwrap();
    assert_eq!(recs.len(), 2);
    assert!(recs.iter().all(|r| r.provenance == ScorerKind::Hybrid));
}

#[test]
fn test_unknown_user_is_a_marker() {
    let catalog = create_test_setup();
    let content = ContentScorer::new(catalog.clone());

    assert_eq!(content.recommend(77), Outcome::UserNotFound);
    assert_eq!(content.recommend(2), Outcome::NoSignal);
}
