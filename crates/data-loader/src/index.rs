//! Catalog building and indexing logic.
//!
//! Builds the Catalog from parsed data:
//! - Primary stores (recipes, users, interaction log)
//! - Secondary indices (diet label index)
//! - Aggregate statistics (recipe stats)
//! - Integrity validation

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

impl Catalog {
    /// Load the recipe dataset from a directory containing
    /// `recipes.csv`, `users.csv` and `ratings.csv`.
    ///
    /// Steps:
    /// 1. Parse all three files in parallel
    /// 2. Build the catalog from the parsed rows
    /// 3. Build secondary indices and statistics
    /// 4. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading recipe dataset from {:?}", data_dir);

        let recipes_path = data_dir.join("recipes.csv");
        let users_path = data_dir.join("users.csv");
        let ratings_path = data_dir.join("ratings.csv");

        // Nested joins give three-way parallelism
        let ((recipes, users), interactions) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_recipes(&recipes_path),
                    || parser::parse_users(&users_path),
                )
            },
            || parser::parse_interactions(&ratings_path),
        );

        let recipes = recipes?;
        let users = users?;
        let interactions = interactions?;

        info!(
            "Loaded {} recipes, {} users, {} interactions",
            recipes.len(),
            users.len(),
            interactions.len()
        );

        let catalog = Self::from_parts(recipes, users, interactions)?;
        info!("Catalog successfully built and validated");
        Ok(catalog)
    }

    /// Build a validated catalog from already-parsed tables.
    ///
    /// Rejects duplicate recipe or user ids instead of silently replacing rows.
    pub fn from_parts(
        recipes: Vec<Recipe>,
        users: Vec<User>,
        interactions: Vec<Interaction>,
    ) -> Result<Self> {
        let mut catalog = Catalog::new();

        for recipe in recipes {
            if catalog.recipe_positions.contains_key(&recipe.id) {
                return Err(DataLoadError::DuplicateId {
                    entity: "Recipe".to_string(),
                    id: recipe.id,
                });
            }
            catalog.insert_recipe(recipe);
        }

        for user in users {
            if catalog.user_positions.contains_key(&user.id) {
                return Err(DataLoadError::DuplicateId {
                    entity: "User".to_string(),
                    id: user.id,
                });
            }
            catalog.insert_user(user);
        }

        for interaction in interactions {
            catalog.insert_interaction(interaction);
        }

        catalog.build_secondary_indices();
        catalog.compute_recipe_stats();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Rebuild the diet label index from the recipe store
    pub fn build_secondary_indices(&mut self) {
        self.diet_label_index.clear();
        for recipe in &self.recipes {
            for label in &recipe.diet_labels {
                self.diet_label_index
                    .entry(label.to_ascii_lowercase())
                    .or_default()
                    .push(recipe.id);
            }
        }
        debug!("Indexed {} diet labels", self.diet_label_index.len());
    }

    /// Compute average rating and rating count for every rated recipe
    pub fn compute_recipe_stats(&mut self) {
        self.recipe_stats = self
            .recipe_interactions
            .par_iter()
            .map(|(&recipe_id, interactions)| {
                let rating_count = interactions.len() as u32;
                let total: f64 = interactions.iter().map(|i| i.rating).sum();
                let avg_rating = if rating_count > 0 {
                    total / rating_count as f64
                } else {
                    0.0
                };
                (
                    recipe_id,
                    RecipeStats {
                        avg_rating,
                        rating_count,
                    },
                )
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - Recipe calories are finite and non-negative
    /// - User calorie budgets are finite and positive when present
    /// - Every interaction references a known user and recipe
    /// - Every rating is finite
    pub fn validate(&self) -> Result<()> {
        for recipe in &self.recipes {
            if !recipe.calories.is_finite() || recipe.calories < 0.0 {
                return Err(DataLoadError::InvalidValue {
                    field: format!("calories of recipe {}", recipe.id),
                    value: recipe.calories.to_string(),
                });
            }
        }

        for user in &self.users {
            if let Some(budget) = user.calories_per_day
                && (!budget.is_finite() || budget <= 0.0)
            {
                return Err(DataLoadError::InvalidValue {
                    field: format!("calories_per_day of user {}", user.id),
                    value: budget.to_string(),
                });
            }
        }

        for interaction in &self.interactions {
            if !self.user_positions.contains_key(&interaction.user_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "User".to_string(),
                    id: interaction.user_id,
                });
            }
            if !self.recipe_positions.contains_key(&interaction.recipe_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Recipe".to_string(),
                    id: interaction.recipe_id,
                });
            }
            if !interaction.rating.is_finite() {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: interaction.rating.to_string(),
                });
            }
        }

        Ok(())
    }
}
