//! Sparse user × recipe interaction matrix.
//!
//! Rows follow catalog user order and columns follow catalog recipe order.
//! The matrix is stored in CSR form. Repeated (user, recipe) events are summed
//! into a single entry, and an explicit rating of 0 is kept as a real entry:
//! only the absence of an entry means "missing".

use data_loader::Catalog;
use ndarray::Array2;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Compressed sparse row matrix of summed ratings
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl InteractionMatrix {
    /// Build the matrix from the catalog's interaction log
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let (n_users, n_recipes, _) = catalog.counts();

        let triplets = catalog.interactions().iter().filter_map(|interaction| {
            match (
                catalog.user_position(interaction.user_id),
                catalog.recipe_position(interaction.recipe_id),
            ) {
                (Some(row), Some(col)) => Some((row, col, interaction.rating)),
                _ => {
                    warn!(
                        "Skipping interaction ({}, {}) with unknown endpoint",
                        interaction.user_id, interaction.recipe_id
                    );
                    None
                }
            }
        });

        let matrix = Self::from_triplets(n_users, n_recipes, triplets);
        debug!(
            "Built {}x{} interaction matrix with {} entries",
            matrix.n_rows,
            matrix.n_cols,
            matrix.nnz()
        );
        matrix
    }

    /// Build from (row, col, value) triplets, summing duplicates.
    ///
    /// Triplets outside the shape are ignored.
    pub fn from_triplets(
        n_rows: usize,
        n_cols: usize,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let mut rows: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n_rows];
        for (row, col, value) in triplets {
            if row < n_rows && col < n_cols {
                *rows[row].entry(col).or_insert(0.0) += value;
            }
        }

        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);
        for row in rows {
            for (col, value) in row {
                indices.push(col);
                values.push(value);
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows,
            n_cols,
            indptr,
            indices,
            values,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored entries, explicit zeros included
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of one row, columns ascending
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        if row >= self.n_rows {
            return (&[], &[]);
        }
        let span = self.indptr[row]..self.indptr[row + 1];
        (&self.indices[span.clone()], &self.values[span])
    }

    /// Iterate over the (col, value) entries of one row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (cols, vals) = self.row(row);
        cols.iter().copied().zip(vals.iter().copied())
    }

    /// The stored value, or `None` when the cell has no entry
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let (cols, vals) = self.row(row);
        cols.binary_search(&col).ok().map(|pos| vals[pos])
    }

    /// True when the row has no entries or every entry is zero
    pub fn row_is_zero(&self, row: usize) -> bool {
        self.row(row).1.iter().all(|&v| v == 0.0)
    }

    /// Dense `R · M` where `M` has `n_cols` rows
    pub fn mul_dense(&self, m: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((self.n_rows, m.ncols()));
        for row in 0..self.n_rows {
            let mut out_row = out.row_mut(row);
            for (col, value) in self.row_entries(row) {
                out_row.scaled_add(value, &m.row(col));
            }
        }
        out
    }

    /// Dense `Rᵀ · M` where `M` has `n_rows` rows
    pub fn transpose_mul_dense(&self, m: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((self.n_cols, m.ncols()));
        for row in 0..self.n_rows {
            let source = m.row(row);
            for (col, value) in self.row_entries(row) {
                out.row_mut(col).scaled_add(value, &source);
            }
        }
        out
    }
}
