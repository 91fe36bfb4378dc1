//! Flat row-major storage for one worker's slab, halos included.
//!
//! A `Grid` of `rows × cols` interior cells stores `(rows + 2) × (cols + 2)`
//! values: row `0` and row `rows + 1` are the halo rows, column `0` and
//! column `cols + 1` are the fixed boundary columns.

use crate::solver_error::SolverError;
use serde::{Deserialize, Serialize};

/// 2-D `f32` array with a one-cell frame around the interior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Grid {
    /// A zero-filled grid with `rows × cols` interior cells.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; (rows + 2) * (cols + 2)],
        }
    }

    /// Wrap an existing buffer of length `(rows + 2) * (cols + 2)`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, SolverError> {
        let expected = (rows + 2) * (cols + 2);
        if data.len() != expected {
            return Err(SolverError::ShapeMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Number of interior rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of interior columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Length of one stored row (interior columns plus the two boundary columns).
    #[inline]
    pub fn stride(&self) -> usize {
        self.cols + 2
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows + 2 && j < self.cols + 2);
        i * self.stride() + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f32) {
        let k = self.idx(i, j);
        self.data[k] = v;
    }

    /// Full stored row `i`, boundary columns included.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        let s = self.stride();
        &self.data[i * s..(i + 1) * s]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let s = self.stride();
        &mut self.data[i * s..(i + 1) * s]
    }

    /// Interior columns `1..=cols` of row `i`.
    #[inline]
    pub fn interior_row(&self, i: usize) -> &[f32] {
        &self.row(i)[1..=self.cols]
    }

    #[inline]
    pub fn interior_row_mut(&mut self, i: usize) -> &mut [f32] {
        let cols = self.cols;
        &mut self.row_mut(i)[1..=cols]
    }

    /// Copy `values` into the interior columns of row `i`.
    pub fn set_interior_row(&mut self, i: usize, values: &[f32]) -> Result<(), SolverError> {
        if values.len() != self.cols {
            return Err(SolverError::ShapeMismatch {
                expected: self.cols,
                found: values.len(),
            });
        }
        self.interior_row_mut(i).copy_from_slice(values);
        Ok(())
    }

    /// The whole buffer, row-major.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Iterate over the interior cells as `(i, j, value)`.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (1..=self.rows)
            .flat_map(move |i| (1..=self.cols).map(move |j| (i, j, self.get(i, j))))
    }
}
