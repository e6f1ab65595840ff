//! Shared types for the scoring strategies.
//!
//! Every scorer produces `RankedCandidate`s wrapped in an `Outcome`, so callers
//! can tell "user unknown" and "user has no usable history" apart from a
//! legitimately empty ranking.

use data_loader::{RecipeId, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Which strategy produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScorerKind {
    /// Aggregate positive-rating mass, user independent
    Popularity,
    /// TF-IDF similarity to the user's rating-weighted profile
    Content,
    /// Latent-factor prediction from the interaction matrix
    Collaborative,
    /// Inner join of several scorers' outputs
    Hybrid,
}

impl ScorerKind {
    /// Human readable model name
    pub fn name(&self) -> &'static str {
        match self {
            ScorerKind::Popularity => "Popularity",
            ScorerKind::Content => "ContentBased",
            ScorerKind::Collaborative => "Collaborative",
            ScorerKind::Hybrid => "Hybrid",
        }
    }
}

impl std::fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Extra information attached to a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    /// Per-source scores, most significant source first (hybrid output only)
    pub component_scores: Vec<(ScorerKind, f64)>,
}

/// A scored recipe emitted by one of the scorers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub recipe_id: RecipeId,
    pub score: f64,
    pub provenance: ScorerKind,
    pub metadata: CandidateMetadata,
}

impl RankedCandidate {
    pub fn new(recipe_id: RecipeId, provenance: ScorerKind, score: f64) -> Self {
        Self {
            recipe_id,
            score,
            provenance,
            metadata: CandidateMetadata::default(),
        }
    }
}

/// Ranking order shared by every scorer: score descending, then recipe id ascending.
pub fn rank_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.recipe_id.cmp(&b.recipe_id))
}

/// Result of a per-user scoring request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The user was scored; the payload may still be empty
    Ranked(T),
    /// The user id is not present in the catalog
    UserNotFound,
    /// The user exists but has no usable interaction signal
    NoSignal,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ranked(value) => Outcome::Ranked(f(value)),
            Outcome::UserNotFound => Outcome::UserNotFound,
            Outcome::NoSignal => Outcome::NoSignal,
        }
    }

    pub fn is_ranked(&self) -> bool {
        matches!(self, Outcome::Ranked(_))
    }

    /// The ranked payload, discarding the marker
    pub fn ranked(self) -> Option<T> {
        match self {
            Outcome::Ranked(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything we know about a user that filtering needs.
///
/// Built once per request by `user_context::build_user_context`.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,

    /// Recipes the user has rated at least once
    pub rated_recipes: HashSet<RecipeId>,

    /// Average rating given by the user (0.0 with no history)
    pub avg_rating: f64,

    /// Daily calorie budget from the catalog
    pub calories_per_day: Option<f64>,

    /// Per-meal calorie ceiling derived from the budget
    pub calorie_ceiling: Option<f64>,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }
}
