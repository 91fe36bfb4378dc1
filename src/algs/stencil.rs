//! Five-point Jacobi sweep over one worker's interior.
//!
//! `next[i][j] = 0.25 * (cur[i-1][j] + cur[i+1][j] + cur[i][j-1] + cur[i][j+1] - h² rho[i][j])`
//! for `i in 1..=rows`, `j in 1..=cols`. Halo rows and boundary columns of
//! `next` are never written. With the `rayon` feature the rows are swept in
//! parallel; the arithmetic per cell is identical, so are the results.

use crate::data::grid::Grid;
use crate::solver_error::SolverError;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[inline]
fn sweep_row(above: &[f32], row: &[f32], below: &[f32], rho: &[f32], out: &mut [f32], hsq: f32) {
    let cols = out.len() - 2;
    for j in 1..=cols {
        out[j] = 0.25 * (above[j] + below[j] + row[j - 1] + row[j + 1] - hsq * rho[j]);
    }
}

fn check_shapes(current: &Grid, next: &Grid, rho: &Grid) -> Result<(), SolverError> {
    let expected = current.as_slice().len();
    for g in [next, rho] {
        if g.rows() != current.rows() || g.cols() != current.cols() {
            return Err(SolverError::ShapeMismatch {
                expected,
                found: g.as_slice().len(),
            });
        }
    }
    Ok(())
}

/// Compute the interior of `next` from `current` and the source term `rho`.
///
/// `hsq` is the squared grid spacing. Requires valid halo rows in `current`.
pub fn sweep(current: &Grid, next: &mut Grid, rho: &Grid, hsq: f32) -> Result<(), SolverError> {
    check_shapes(current, next, rho)?;
    let rows = current.rows();

    #[cfg(not(feature = "rayon"))]
    for i in 1..=rows {
        sweep_row(
            current.row(i - 1),
            current.row(i),
            current.row(i + 1),
            rho.row(i),
            next.row_mut(i),
            hsq,
        );
    }

    #[cfg(feature = "rayon")]
    {
        let stride = next.stride();
        next.as_mut_slice()
            .par_chunks_mut(stride)
            .enumerate()
            .skip(1)
            .take(rows)
            .for_each(|(i, out)| {
                sweep_row(
                    current.row(i - 1),
                    current.row(i),
                    current.row(i + 1),
                    rho.row(i),
                    out,
                    hsq,
                )
            });
    }

    Ok(())
}
