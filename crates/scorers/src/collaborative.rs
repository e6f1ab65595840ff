//! Collaborative Scorer - Latent-factor predictions
//!
//! One truncated SVD of the whole interaction matrix is fitted at construction.
//! A user's predicted affinity for every recipe is their row of the rank-k
//! reconstruction, min-max normalized to [0, 1].

use crate::interactions::InteractionMatrix;
use crate::latent::{truncated_svd, LatentFactors, SvdConfig};
use crate::types::{rank_order, Outcome, RankedCandidate, ScorerKind};
use data_loader::{Catalog, UserId};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Collaborative-filtering scorer backed by a cached factorization
pub struct CollaborativeScorer {
    catalog: Arc<Catalog>,
    matrix: Arc<InteractionMatrix>,
    factors: LatentFactors,
}

impl CollaborativeScorer {
    /// Factorize `matrix` once; the factors live as long as the scorer
    pub fn new(catalog: Arc<Catalog>, matrix: Arc<InteractionMatrix>, config: &SvdConfig) -> Self {
        let factors = truncated_svd(&matrix, config);
        info!(
            "Collaborative model fitted: {} latent factors over {:?} matrix",
            factors.rank(),
            matrix.shape()
        );

        Self {
            catalog,
            matrix,
            factors,
        }
    }

    pub fn name(&self) -> &'static str {
        ScorerKind::Collaborative.name()
    }

    pub fn factors(&self) -> &LatentFactors {
        &self.factors
    }

    /// Predict and rank every recipe for the user
    #[instrument(skip(self), fields(user_id = user_id))]
    pub fn recommend(&self, user_id: UserId) -> Outcome<Vec<RankedCandidate>> {
        let Some(row) = self.catalog.user_position(user_id) else {
            debug!("User {} not in catalog", user_id);
            return Outcome::UserNotFound;
        };

        if self.matrix.row_is_zero(row) {
            debug!("User {} has an all-zero interaction row", user_id);
            return Outcome::NoSignal;
        }

        let predictions = self.factors.reconstruct_row(&self.matrix, row);
        let scores = min_max_normalize(predictions.as_slice().unwrap_or(&[]));

        let mut candidates: Vec<RankedCandidate> = self
            .catalog
            .recipes()
            .iter()
            .zip(scores)
            .map(|(recipe, score)| RankedCandidate::new(recipe.id, ScorerKind::Collaborative, score))
            .collect();
        candidates.sort_by(rank_order);

        debug!("Predicted {} recipes", candidates.len());
        Outcome::Ranked(candidates)
    }
}

/// Rescale to [0, 1]; a constant input maps to all zeros
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}
