//! Per-worker field state: the two Jacobi buffers and the source term.

use crate::data::boundary::BoundaryValues;
use crate::data::grid::Grid;
use crate::solver_error::SolverError;
use crate::topology::WorkerTopology;

/// The slab of the solution owned by one worker.
///
/// `current` is read by the stencil and by the exchange; `next` receives the
/// sweep. Both carry the same physical boundary values so that [`Field::swap`]
/// never exposes a stale edge. `rho` is never exchanged; its halo is unused.
#[derive(Clone, Debug)]
pub struct Field {
    topology: WorkerTopology,
    current: Grid,
    next: Grid,
    rho: Grid,
}

impl Field {
    /// Allocate a zero field for `topology`'s slab with `cols` interior columns
    /// and stamp the physical boundary into both state buffers.
    pub fn new(
        topology: WorkerTopology,
        cols: usize,
        boundary: &BoundaryValues,
    ) -> Result<Self, SolverError> {
        if cols == 0 {
            return Err(SolverError::InvalidConfig("grid must have columns".into()));
        }
        let rows = topology.slab_height();
        let mut current = Grid::zeros(rows, cols);
        boundary.apply(&mut current, &topology);
        let next = current.clone();
        Ok(Self {
            topology,
            current,
            next,
            rho: Grid::zeros(rows, cols),
        })
    }

    #[inline]
    pub fn topology(&self) -> &WorkerTopology {
        &self.topology
    }

    #[inline]
    pub fn current(&self) -> &Grid {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut Grid {
        &mut self.current
    }

    #[inline]
    pub fn next(&self) -> &Grid {
        &self.next
    }

    #[inline]
    pub fn rho(&self) -> &Grid {
        &self.rho
    }

    /// Borrow the pieces a sweep needs: `(current, next, rho)`.
    #[inline]
    pub fn sweep_buffers(&mut self) -> (&Grid, &mut Grid, &Grid) {
        (&self.current, &mut self.next, &self.rho)
    }

    /// Exchange the roles of the two state buffers. No data is copied.
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Set the initial value of global interior cell `(global_row, col)`.
    ///
    /// Returns `Ok(false)` when the row belongs to another worker.
    pub fn seed_initial(
        &mut self,
        global_row: usize,
        col: usize,
        value: f32,
    ) -> Result<bool, SolverError> {
        let Some(i) = self.locate(global_row, col)? else {
            return Ok(false);
        };
        self.current.set(i, col, value);
        self.next.set(i, col, value);
        Ok(true)
    }

    /// Set the source term at global interior cell `(global_row, col)`.
    pub fn seed_source(
        &mut self,
        global_row: usize,
        col: usize,
        value: f32,
    ) -> Result<bool, SolverError> {
        let Some(i) = self.locate(global_row, col)? else {
            return Ok(false);
        };
        self.rho.set(i, col, value);
        Ok(true)
    }

    /// Fill the local source term from a function of global `(row, col)`.
    pub fn fill_source(&mut self, mut f: impl FnMut(usize, usize) -> f32) {
        let first = self.topology.first_global_row();
        for i in 1..=self.rho.rows() {
            let g = first + i - 1;
            for (j, v) in self.rho.interior_row_mut(i).iter_mut().enumerate() {
                *v = f(g, j + 1);
            }
        }
    }

    fn locate(&self, global_row: usize, col: usize) -> Result<Option<usize>, SolverError> {
        let total_rows = self.topology.slab_height() * self.topology.workers();
        if global_row == 0 || global_row > total_rows || col == 0 || col > self.current.cols() {
            return Err(SolverError::InvalidConfig(format!(
                "cell ({global_row}, {col}) is outside the {total_rows}x{} interior",
                self.current.cols()
            )));
        }
        Ok(self.topology.local_row(global_row))
    }
}
