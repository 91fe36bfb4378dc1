//! Slab decomposition of the row axis among a fixed group of workers.
//!
//! Rank 0 owns the first `slab_height` interior rows (global rows
//! `1..=slab_height`), rank 1 the next band, and so on. The "down" neighbour
//! of a worker is `rank - 1` and the "up" neighbour is `rank + 1`; the two
//! workers at the physical edges of the domain have only one of them.
//!
//! Only exact division is supported: `rows % workers` must be zero.

use crate::solver_error::SolverError;

/// Position of one worker in the slab decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerTopology {
    workers: usize,
    rank: usize,
    slab_height: usize,
    up: Option<usize>,
    down: Option<usize>,
}

impl WorkerTopology {
    /// Decompose `rows` interior rows across `workers` and return the view of `rank`.
    ///
    /// # Errors
    /// - [`SolverError::InvalidConfig`] if `rows` or `workers` is zero, or a
    ///   worker would own no rows.
    /// - [`SolverError::UnevenDecomposition`] if `rows` is not a multiple of `workers`.
    /// - [`SolverError::RankOutOfRange`] if `rank >= workers`.
    pub fn new(rows: usize, workers: usize, rank: usize) -> Result<Self, SolverError> {
        if workers == 0 {
            return Err(SolverError::InvalidConfig(
                "worker count must be at least 1".into(),
            ));
        }
        if rows == 0 {
            return Err(SolverError::InvalidConfig("grid must have rows".into()));
        }
        if rows < workers {
            return Err(SolverError::InvalidConfig(format!(
                "{rows} rows cannot give every one of {workers} workers a slab"
            )));
        }
        if rows % workers != 0 {
            return Err(SolverError::UnevenDecomposition { rows, workers });
        }
        if rank >= workers {
            return Err(SolverError::RankOutOfRange { rank, workers });
        }
        Ok(Self {
            workers,
            rank,
            slab_height: rows / workers,
            up: (rank + 1 < workers).then_some(rank + 1),
            down: rank.checked_sub(1),
        })
    }

    /// Topologies of every rank in the group, in rank order.
    pub fn decompose(rows: usize, workers: usize) -> Result<Vec<Self>, SolverError> {
        (0..workers)
            .map(|rank| Self::new(rows, workers, rank))
            .collect()
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of interior rows owned by this worker.
    #[inline]
    pub fn slab_height(&self) -> usize {
        self.slab_height
    }

    /// Neighbour owning the next band of rows (`rank + 1`), if any.
    #[inline]
    pub fn up(&self) -> Option<usize> {
        self.up
    }

    /// Neighbour owning the previous band of rows (`rank - 1`), if any.
    #[inline]
    pub fn down(&self) -> Option<usize> {
        self.down
    }

    /// Whether this worker's top halo lies on the physical domain edge.
    #[inline]
    pub fn owns_top_edge(&self) -> bool {
        self.down.is_none()
    }

    /// Whether this worker's bottom halo lies on the physical domain edge.
    #[inline]
    pub fn owns_bottom_edge(&self) -> bool {
        self.up.is_none()
    }

    /// Global 1-based index of this worker's first interior row.
    #[inline]
    pub fn first_global_row(&self) -> usize {
        self.rank * self.slab_height + 1
    }

    /// Map a global 1-based interior row to this worker's local row, if owned.
    pub fn local_row(&self, global_row: usize) -> Option<usize> {
        let first = self.first_global_row();
        (global_row >= first && global_row < first + self.slab_height)
            .then(|| global_row - first + 1)
    }
}
