//! Core domain types for the recipe catalog.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for domain clarity (UserId, RecipeId)
//! - Recipe, User and Interaction records
//! - The `DietLabel` tags that drive per-label quotas
//! - `Catalog`, the in-memory database every scorer reads from

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with recipe IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a recipe
pub type RecipeId = u32;

// =============================================================================
// Recipe-related Types
// =============================================================================

/// A recipe from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: String,
    pub cook_method: String,
    /// Diet tags in source order, without duplicates (e.g. `["balanced", "lowfat"]`)
    pub diet_labels: Vec<String>,
    /// Calories per serving, always finite and >= 0 once validated
    pub calories: f64,
}

impl Recipe {
    /// Whether the recipe carries the given diet tag (exact, case-insensitive)
    pub fn has_label(&self, label: &str) -> bool {
        self.diet_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(label))
    }

    /// Diet tags joined back into the space-separated source form
    pub fn diet_labels_text(&self) -> String {
        self.diet_labels.join(" ")
    }
}

/// Diet labels used for per-label representation quotas.
///
/// Recipes may carry other free-form tags; only these take part in quota bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietLabel {
    Balanced,
    HighProtein,
    HighFiber,
    LowCarb,
    LowFat,
    LowSodium,
}

impl DietLabel {
    /// Every quota label, in bucket order
    pub const ALL: [DietLabel; 6] = [
        DietLabel::Balanced,
        DietLabel::HighProtein,
        DietLabel::HighFiber,
        DietLabel::LowCarb,
        DietLabel::LowFat,
        DietLabel::LowSodium,
    ];

    /// The tag as it appears in the `diet_labels` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DietLabel::Balanced => "balanced",
            DietLabel::HighProtein => "highprotein",
            DietLabel::HighFiber => "highfiber",
            DietLabel::LowCarb => "lowcarb",
            DietLabel::LowFat => "lowfat",
            DietLabel::LowSodium => "lowsodium",
        }
    }

    /// Parse a tag, returning `None` for tags outside the quota set
    pub fn from_tag(tag: &str) -> Option<Self> {
        DietLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for DietLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// User and Interaction Types
// =============================================================================

/// A user of the diet tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Daily calorie budget; `None` disables calorie filtering for this user
    pub calories_per_day: Option<f64>,
}

/// A single (user, recipe, rating) event from the interaction log.
///
/// The log is not deduplicated: the same pair may appear several times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
    pub rating: f64,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed rating statistics for a recipe
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecipeStats {
    pub avg_rating: f64,
    pub rating_count: u32,
}

// =============================================================================
// Catalog - The Core In-Memory Database
// =============================================================================

/// Holds recipes, users and the interaction log, plus lookup indices.
///
/// Recipes and users keep their insertion order: that order defines the
/// row/column positions of the interaction matrix and the content vectors.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    // Primary data stores, in stable order
    pub(crate) recipes: Vec<Recipe>,
    pub(crate) users: Vec<User>,
    pub(crate) interactions: Vec<Interaction>,

    // Position lookups
    pub(crate) recipe_positions: HashMap<RecipeId, usize>,
    pub(crate) user_positions: HashMap<UserId, usize>,

    // Interaction indices
    pub(crate) user_interactions: HashMap<UserId, Vec<Interaction>>,
    pub(crate) recipe_interactions: HashMap<RecipeId, Vec<Interaction>>,

    // Secondary indices
    /// Recipes grouped by lowercase diet tag (one recipe can appear under several tags)
    pub(crate) diet_label_index: HashMap<String, Vec<RecipeId>>,
    pub(crate) recipe_stats: HashMap<RecipeId, RecipeStats>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipe_positions.get(&id).map(|&pos| &self.recipes[pos])
    }

    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.user_positions.get(&id).map(|&pos| &self.users[pos])
    }

    /// Position of a recipe in catalog order (column index of the interaction matrix)
    pub fn recipe_position(&self, id: RecipeId) -> Option<usize> {
        self.recipe_positions.get(&id).copied()
    }

    /// Position of a user in catalog order (row index of the interaction matrix)
    pub fn user_position(&self, id: UserId) -> Option<usize> {
        self.user_positions.get(&id).copied()
    }

    /// All recipes in catalog order
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// All users in catalog order
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The full interaction log in insertion order
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Get all interactions made by a user
    ///
    /// Returns an empty slice if the user has none
    pub fn get_user_interactions(&self, user_id: UserId) -> &[Interaction] {
        self.user_interactions
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all interactions received by a recipe
    pub fn get_recipe_interactions(&self, recipe_id: RecipeId) -> &[Interaction] {
        self.recipe_interactions
            .get(&recipe_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all recipes carrying a diet tag
    pub fn get_recipes_by_label(&self, label: &str) -> &[RecipeId] {
        self.diet_label_index
            .get(&label.to_ascii_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_recipe_stats(&self, recipe_id: RecipeId) -> Option<&RecipeStats> {
        self.recipe_stats.get(&recipe_id)
    }

    /// Case-insensitive substring search over recipe names, in catalog order
    pub fn search_by_name(&self, query: &str) -> Vec<&Recipe> {
        let needle = query.to_lowercase();
        self.recipes
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    // Mutators - used while loading, before any engine is built

    /// Insert a recipe, replacing an existing one with the same id in place
    pub fn insert_recipe(&mut self, recipe: Recipe) {
        match self.recipe_positions.get(&recipe.id) {
            Some(&pos) => self.recipes[pos] = recipe,
            None => {
                self.recipe_positions.insert(recipe.id, self.recipes.len());
                self.recipes.push(recipe);
            }
        }
    }

    /// Insert a user, replacing an existing one with the same id in place.
    ///
    /// New users are appended, so existing matrix rows keep their positions.
    pub fn insert_user(&mut self, user: User) {
        match self.user_positions.get(&user.id) {
            Some(&pos) => self.users[pos] = user,
            None => {
                self.user_positions.insert(user.id, self.users.len());
                self.users.push(user);
            }
        }
    }

    /// Append an interaction to the log and update indices
    pub fn insert_interaction(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);

        self.user_interactions
            .entry(interaction.user_id)
            .or_default()
            .push(interaction);

        self.recipe_interactions
            .entry(interaction.recipe_id)
            .or_default()
            .push(interaction);
    }

    /// Get counts for debugging/validation: (users, recipes, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.recipes.len(), self.interactions.len())
    }
}
