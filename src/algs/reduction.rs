//! Convergence test: local squared-difference norm and its global sum.

use crate::algs::communicator::Communicator;
use crate::data::grid::Grid;
use crate::solver_error::SolverError;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Last reduced norm and the number of completed sweeps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConvergenceState {
    pub global_norm: f64,
    pub iteration: usize,
}

#[inline]
fn row_norm(current: &[f32], next: &[f32]) -> f64 {
    current
        .iter()
        .zip(next)
        .map(|(&c, &n)| {
            let d = f64::from(n) - f64::from(c);
            d * d
        })
        .sum()
}

/// `Σ (next - current)²` over the interior cells, accumulated in `f64`.
///
/// Row partials are summed in row order regardless of the `rayon` feature.
pub fn local_norm(current: &Grid, next: &Grid) -> f64 {
    let rows = current.rows().min(next.rows());

    #[cfg(not(feature = "rayon"))]
    let partials: Vec<f64> = (1..=rows)
        .map(|i| row_norm(current.interior_row(i), next.interior_row(i)))
        .collect();

    #[cfg(feature = "rayon")]
    let partials: Vec<f64> = (1..=rows)
        .into_par_iter()
        .map(|i| row_norm(current.interior_row(i), next.interior_row(i)))
        .collect();

    partials.iter().sum()
}

/// Combine every worker's local norm. Blocks until all have contributed.
pub fn global_norm<C: Communicator>(comm: &C, local: f64) -> Result<f64, SolverError> {
    comm.all_reduce_sum(local).inspect_err(|e| {
        log::warn!("[rank {}] norm reduction failed: {e}", comm.rank());
    })
}

/// `sqrt(global_norm) < sqrt(residual)`.
#[inline]
pub fn is_converged(global_norm: f64, residual: f64) -> bool {
    global_norm.sqrt() < residual.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;

    #[test]
    fn norm_ignores_halos_and_boundary_columns() {
        let cur = Grid::zeros(2, 2);
        let mut next = Grid::zeros(2, 2);
        next.row_mut(0).fill(100.0);
        next.set(1, 0, 100.0);
        next.set(1, 1, 3.0);
        next.set(2, 2, -4.0);
        assert_eq!(local_norm(&cur, &next), 25.0);
    }

    #[test]
    fn single_worker_reduction_is_identity() {
        assert_eq!(global_norm(&NoComm, 1.25).unwrap(), 1.25);
    }

    #[test]
    fn threshold_is_strict() {
        assert!(is_converged(0.0099, 0.01));
        assert!(!is_converged(0.01, 0.01));
    }
}
