//! Content Scorer - TF-IDF similarity to a user profile
//!
//! Every recipe is vectorized once from "cook method + ingredients + diet labels".
//! A user is represented by the rating-weighted sum of the vectors of the
//! recipes they rated, L2-normalized. All recipes are then ranked by the dot
//! product with that profile.
//!
//! Profiles are computed lazily and memoized per user. Call `invalidate` when a
//! user's history changes.

use crate::text::{SparseVector, TfidfVectorizer};
use crate::types::{rank_order, Outcome, RankedCandidate, ScorerKind};
use dashmap::DashMap;
use data_loader::{Catalog, Recipe, UserId};
use ndarray::Array1;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Text fed to the vectorizer for one recipe
pub fn recipe_document(recipe: &Recipe) -> String {
    format!(
        "{} {} {}",
        recipe.cook_method,
        recipe.ingredients,
        recipe.diet_labels_text()
    )
}

/// Content-based scorer over a frozen TF-IDF space
pub struct ContentScorer {
    /// Shared, read-only catalog
    catalog: Arc<Catalog>,

    /// One vector per recipe, in catalog order
    recipe_vectors: Vec<SparseVector>,

    n_features: usize,

    /// Memoized profiles; `None` records "no signal"
    profiles: DashMap<UserId, Option<Arc<Array1<f64>>>>,
}

impl ContentScorer {
    /// Vectorize the catalog with the default vectorizer settings
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_vectorizer(catalog, TfidfVectorizer::new())
    }

    /// Vectorize the catalog with a custom (unfitted) vectorizer
    pub fn with_vectorizer(catalog: Arc<Catalog>, mut vectorizer: TfidfVectorizer) -> Self {
        let documents: Vec<String> = catalog.recipes().par_iter().map(recipe_document).collect();
        let recipe_vectors = vectorizer.fit_transform(&documents);
        let n_features = vectorizer.n_features();

        info!("TF-IDF matrix built with {} features", n_features);

        Self {
            catalog,
            recipe_vectors,
            n_features,
            profiles: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        ScorerKind::Content.name()
    }

    /// Size of the frozen vocabulary
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of memoized profiles, "no signal" entries included
    pub fn cached_profiles(&self) -> usize {
        self.profiles.len()
    }

    /// Drop a memoized profile. Returns true if one was cached.
    pub fn invalidate(&self, user_id: UserId) -> bool {
        self.profiles.remove(&user_id).is_some()
    }

    /// Rank every recipe by similarity to the user's profile
    #[instrument(skip(self), fields(user_id = user_id))]
    pub fn recommend(&self, user_id: UserId) -> Outcome<Vec<RankedCandidate>> {
        if self.catalog.get_user(user_id).is_none() {
            debug!("User {} not in catalog", user_id);
            return Outcome::UserNotFound;
        }

        let Some(profile) = self.profile(user_id) else {
            debug!("User {} has no content profile", user_id);
            return Outcome::NoSignal;
        };
        let profile = profile.as_slice().unwrap_or(&[]);

        let mut candidates: Vec<RankedCandidate> = self
            .catalog
            .recipes()
            .iter()
            .zip(&self.recipe_vectors)
            .map(|(recipe, vector)| {
                RankedCandidate::new(recipe.id, ScorerKind::Content, vector.dot_dense(profile))
            })
            .collect();
        candidates.sort_by(rank_order);

        debug!("Scored {} recipes by content", candidates.len());
        Outcome::Ranked(candidates)
    }

    /// The user's normalized profile, computing and caching it on first use
    pub fn profile(&self, user_id: UserId) -> Option<Arc<Array1<f64>>> {
        self.profiles
            .entry(user_id)
            .or_insert_with(|| self.build_profile(user_id).map(Arc::new))
            .clone()
    }

    fn build_profile(&self, user_id: UserId) -> Option<Array1<f64>> {
        let interactions = self.catalog.get_user_interactions(user_id);
        if interactions.is_empty() {
            return None;
        }

        let rating_sum: f64 = interactions.iter().map(|i| i.rating).sum();
        if rating_sum == 0.0 {
            return None;
        }

        let mut profile = Array1::<f64>::zeros(self.n_features);
        for interaction in interactions {
            let Some(pos) = self.catalog.recipe_position(interaction.recipe_id) else {
                continue;
            };
            let vector = &self.recipe_vectors[pos];
            for (&idx, &weight) in vector.indices.iter().zip(&vector.values) {
                profile[idx] += interaction.rating * weight;
            }
        }

        let norm = profile.dot(&profile).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        profile.mapv_inplace(|v| v / norm);
        Some(profile)
    }
}
