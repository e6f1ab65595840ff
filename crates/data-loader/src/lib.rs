//! # Data Loader Crate
//!
//! Loads and indexes the recipe dataset consumed by the recommendation engine.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Recipe, User, Interaction, Catalog)
//! - **parser**: Parse the CSV tables into Rust structs
//! - **index**: Build indices and statistics, validate integrity
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_files(Path::new("data"))?;
//!
//! let recipe = catalog.get_recipe(17652).unwrap();
//! let history = catalog.get_user_interactions(1);
//!
//! println!("{} has {} calories, user 1 rated {} recipes", recipe.name, recipe.calories, history.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    RecipeId,
    // Core types
    Recipe,
    User,
    Interaction,
    Catalog,
    RecipeStats,
    // Enums
    DietLabel,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn oat_bowl() -> Recipe {
        Recipe {
            id: 1,
            name: "Oat Bowl".to_string(),
            ingredients: "oats milk honey".to_string(),
            cook_method: "stir".to_string(),
            diet_labels: vec!["balanced".to_string(), "lowfat".to_string()],
            calories: 210.0,
        }
    }

    #[test]
    fn test_catalog_creation() {
        let catalog = Catalog::new();
        let (users, recipes, interactions) = catalog.counts();

        assert_eq!(users, 0);
        assert_eq!(recipes, 0);
        assert_eq!(interactions, 0);
    }

    #[test]
    fn test_insert_recipe_keeps_order() {
        let mut catalog = Catalog::new();

        let mut second = oat_bowl();
        second.id = 5;
        catalog.insert_recipe(second);
        catalog.insert_recipe(oat_bowl());

        assert_eq!(catalog.recipe_position(5), Some(0));
        assert_eq!(catalog.recipe_position(1), Some(1));
        assert_eq!(catalog.get_recipe(1).unwrap().name, "Oat Bowl");
        assert!(catalog.get_recipe(1).unwrap().has_label("LowFat"));
        assert_eq!(catalog.get_recipe(1).unwrap().diet_labels_text(), "balanced lowfat");
    }

    #[test]
    fn test_insert_user_appends() {
        let mut catalog = Catalog::new();
        catalog.insert_user(User { id: 10, calories_per_day: Some(2000.0) });
        catalog.insert_user(User { id: 3, calories_per_day: None });

        assert_eq!(catalog.user_position(10), Some(0));
        assert_eq!(catalog.user_position(3), Some(1));
        assert_eq!(catalog.get_user(3).unwrap().calories_per_day, None);
    }

    #[test]
    fn test_insert_interaction() {
        let mut catalog = Catalog::new();
        catalog.insert_interaction(Interaction { user_id: 1, recipe_id: 17652, rating: 5.0 });

        assert_eq!(catalog.get_user_interactions(1).len(), 1);
        assert_eq!(catalog.get_recipe_interactions(17652)[0].rating, 5.0);
        assert_eq!(catalog.interactions().len(), 1);
    }

    #[test]
    fn test_search_by_name() {
        let mut catalog = Catalog::new();
        catalog.insert_recipe(oat_bowl());

        assert_eq!(catalog.search_by_name("oat").len(), 1);
        assert!(catalog.search_by_name("brownie").is_empty());
    }

    #[test]
    fn test_diet_label_tags() {
        assert_eq!(DietLabel::from_tag("HighProtein"), Some(DietLabel::HighProtein));
        assert_eq!(DietLabel::from_tag("vegan"), None);
        assert_eq!(DietLabel::LowSodium.to_string(), "lowsodium");
    }

    #[test]
    fn test_empty_queries() {
        let catalog = Catalog::new();

        assert!(catalog.get_user(999).is_none());
        assert!(catalog.get_recipe(999).is_none());
        assert!(catalog.get_user_interactions(999).is_empty());
        assert!(catalog.get_recipe_interactions(999).is_empty());
        assert!(catalog.get_recipes_by_label("balanced").is_empty());
    }
}
