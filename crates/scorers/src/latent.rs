//! Truncated SVD of the interaction matrix.
//!
//! Randomized subspace iteration followed by a Rayleigh-Ritz step:
//! 1. Start from a seeded random `n_cols × l` block `Q`
//! 2. Repeat `Q = qr(Rᵀ (R Q)).q` for a fixed number of iterations
//! 3. Take the dense SVD `R Q = Ũ Σ Wᵀ` of the small projected matrix
//! 4. Right singular vectors of `R` are `V = Q W`
//!
//! Only the right factors are kept. A user's reconstructed row
//! `U Σ Vᵀ` equals `(r_u V) Vᵀ`, so predictions never need `U`.

use crate::interactions::InteractionMatrix;
use nalgebra::{DMatrix, SVD};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Relative threshold under which a singular value counts as zero
const ZERO_SINGULAR_TOL: f64 = 1e-10;

/// Factorization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvdConfig {
    /// Target rank before clamping to the matrix shape
    pub rank: usize,
    /// Extra subspace columns beyond the target rank
    pub oversamples: usize,
    /// Power iterations
    pub n_iter: usize,
    /// Seed for the random starting block
    pub seed: u64,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            rank: 100,
            oversamples: 10,
            n_iter: 7,
            seed: 42,
        }
    }
}

impl SvdConfig {
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Right singular vectors and singular values, largest first
#[derive(Debug, Clone)]
pub struct LatentFactors {
    /// `n_cols × k`, orthonormal columns
    pub item_factors: Array2<f64>,
    /// Length `k`, strictly positive, descending
    pub singular_values: Array1<f64>,
}

impl LatentFactors {
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Row `row` of the rank-k reconstruction, over all columns
    pub fn reconstruct_row(&self, matrix: &InteractionMatrix, row: usize) -> Array1<f64> {
        let mut projected = Array1::zeros(self.rank());
        for (col, value) in matrix.row_entries(row) {
            projected.scaled_add(value, &self.item_factors.row(col));
        }
        self.item_factors.dot(&projected)
    }
}

/// Fit a truncated SVD with rank `min(config.rank, n_rows, n_cols)`.
///
/// Numerically zero singular values are dropped, so the returned rank may be lower.
#[instrument(skip(matrix, config), fields(shape = ?matrix.shape(), rank = config.rank))]
pub fn truncated_svd(matrix: &InteractionMatrix, config: &SvdConfig) -> LatentFactors {
    let (n_rows, n_cols) = matrix.shape();
    let target = config.rank.min(n_rows).min(n_cols);
    if target == 0 || matrix.nnz() == 0 {
        return empty_factors(n_cols);
    }

    let width = (target + config.oversamples).min(n_cols);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start = Array2::from_shape_fn((n_cols, width), |_| rng.random_range(-1.0..1.0));
    let mut q = orthonormal_basis(&start);

    for _ in 0..config.n_iter {
        let projected = matrix.mul_dense(&q);
        q = orthonormal_basis(&matrix.transpose_mul_dense(&projected));
    }

    // Rayleigh-Ritz: the small projected matrix carries the leading singular triplets
    let projected = to_dmatrix(&matrix.mul_dense(&q));
    let svd = SVD::new(projected, false, true);
    let Some(v_t) = svd.v_t else {
        warn!("SVD of the projected matrix returned no right singular vectors");
        return empty_factors(n_cols);
    };
    let sigma = svd.singular_values;

    let mut order: Vec<usize> = (0..sigma.len()).collect();
    order.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

    let sigma_max = order.first().map(|&idx| sigma[idx]).unwrap_or(0.0);
    let kept: Vec<usize> = order
        .into_iter()
        .filter(|&idx| sigma[idx] > 0.0 && sigma[idx] > sigma_max * ZERO_SINGULAR_TOL)
        .take(target)
        .collect();

    // Columns of W are the kept right singular vectors of the projected matrix
    let w = Array2::from_shape_fn((width, kept.len()), |(i, j)| v_t[(kept[j], i)]);
    let item_factors = q.dot(&w);
    let singular_values = Array1::from_iter(kept.iter().map(|&idx| sigma[idx]));

    debug!(
        "Truncated SVD kept {} of {} requested factors",
        singular_values.len(),
        target
    );

    LatentFactors {
        item_factors,
        singular_values,
    }
}

fn empty_factors(n_cols: usize) -> LatentFactors {
    LatentFactors {
        item_factors: Array2::zeros((n_cols, 0)),
        singular_values: Array1::zeros(0),
    }
}

/// Thin-QR orthonormal basis for the columns of `m` (`m` must not be wider than tall)
fn orthonormal_basis(m: &Array2<f64>) -> Array2<f64> {
    let q = to_dmatrix(m).qr().q();
    Array2::from_shape_fn((q.nrows(), q.ncols()), |(i, j)| q[(i, j)])
}

fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]])
}
