//! Dirichlet values on the four physical edges of the domain.

use crate::data::grid::Grid;
use crate::topology::WorkerTopology;
use serde::{Deserialize, Serialize};

/// Fixed values held by the domain's outer frame.
///
/// `top` is the row above global row 1 (on rank 0), `bottom` the row below
/// the last global row (on the last rank), `left`/`right` the boundary
/// columns on every worker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryValues {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Default for BoundaryValues {
    fn default() -> Self {
        Self {
            top: 0.0,
            bottom: 0.0,
            left: 10.0,
            right: 0.0,
        }
    }
}

impl BoundaryValues {
    /// Every edge held at `v`.
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            bottom: v,
            left: v,
            right: v,
        }
    }

    /// Write the physical-edge values that fall on `topology`'s slab into `grid`.
    ///
    /// Halo rows facing a neighbour are left alone; they belong to the exchange.
    /// Corner cells take the column value. The stencil never reads them.
    pub fn apply(&self, grid: &mut Grid, topology: &WorkerTopology) {
        let last = grid.rows() + 1;
        if topology.owns_top_edge() {
            grid.row_mut(0).fill(self.top);
        }
        if topology.owns_bottom_edge() {
            grid.row_mut(last).fill(self.bottom);
        }
        let right = grid.cols() + 1;
        for i in 0..=last {
            grid.set(i, 0, self.left);
            grid.set(i, right, self.right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_worker_only_gets_columns() {
        let t = WorkerTopology::new(6, 3, 1).unwrap();
        let mut g = Grid::zeros(2, 3);
        BoundaryValues {
            top: 1.0,
            bottom: 2.0,
            left: 3.0,
            right: 4.0,
        }
        .apply(&mut g, &t);
        assert_eq!(g.interior_row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(g.interior_row(3), &[0.0, 0.0, 0.0]);
        for i in 0..4 {
            assert_eq!(g.get(i, 0), 3.0);
            assert_eq!(g.get(i, 4), 4.0);
        }
    }

    #[test]
    fn edge_workers_get_their_rows() {
        let tops = WorkerTopology::decompose(4, 2).unwrap();
        let b = BoundaryValues {
            top: 1.0,
            bottom: 2.0,
            left: 0.0,
            right: 0.0,
        };
        let mut g0 = Grid::zeros(2, 2);
        let mut g1 = Grid::zeros(2, 2);
        b.apply(&mut g0, &tops[0]);
        b.apply(&mut g1, &tops[1]);
        assert_eq!(g0.interior_row(0), &[1.0, 1.0]);
        assert_eq!(g0.interior_row(3), &[0.0, 0.0]);
        assert_eq!(g1.interior_row(0), &[0.0, 0.0]);
        assert_eq!(g1.interior_row(3), &[2.0, 2.0]);
    }
}
