//! Run a whole worker group inside one process, one thread per rank.
//!
//! This is the in-memory stand-in for an MPI launch: every worker gets its
//! own [`LocalComm`] and its own [`Field`](crate::data::Field); nothing else is
//! shared. A worker that fails aborts the group so that its partners return
//! an error instead of waiting forever.

use crate::algs::communicator::{Communicator, LocalComm};
use crate::config::SolverConfig;
use crate::data::grid::Grid;
use crate::solver::{Solution, solve};
use crate::solver_error::SolverError;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Solve `config` with `workers` in-process workers; solutions come back in rank order.
///
/// Either every worker succeeds or the first failure is returned.
pub fn run_local(config: &SolverConfig, workers: usize) -> Result<Vec<Solution>, SolverError> {
    config.validate(workers)?;
    let group = LocalComm::group(workers);

    let outcomes: Vec<(Result<Solution, SolverError>, bool)> = thread::scope(|s| {
        let handles: Vec<_> = group
            .iter()
            .map(|comm| {
                s.spawn(move || {
                    let res = panic::catch_unwind(AssertUnwindSafe(|| solve(config, comm)))
                        .unwrap_or_else(|_| Err(SolverError::WorkerPanicked(comm.rank())));
                    let mut first_failure = false;
                    if res.is_err() {
                        first_failure = !comm.is_aborted();
                        comm.abort();
                    }
                    (res, first_failure)
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, h)| {
                h.join()
                    .unwrap_or_else(|_| (Err(SolverError::WorkerPanicked(rank)), false))
            })
            .collect()
    });

    let mut solutions = Vec::with_capacity(workers);
    let mut root = None;
    let mut fallout = None;
    for (res, first_failure) in outcomes {
        match res {
            Ok(sol) => solutions.push(sol),
            Err(e) if first_failure && root.is_none() => root = Some(e),
            Err(e) => {
                fallout.get_or_insert(e);
            }
        }
    }
    match root.or(fallout) {
        Some(err) => Err(err),
        None => Ok(solutions),
    }
}

/// Stitch per-worker final grids back into one `(rows + 2) × (cols + 2)` grid.
///
/// The top frame row comes from rank 0, the bottom one from the last rank;
/// interior halos are dropped.
pub fn assemble_global(solutions: &[Solution]) -> Result<Grid, SolverError> {
    let first = solutions
        .first()
        .ok_or_else(|| SolverError::InvalidConfig("no worker solutions to assemble".into()))?;
    let cols = first.grid().cols();
    let rows: usize = solutions.iter().map(|s| s.grid().rows()).sum();
    let mut global = Grid::zeros(rows, cols);

    global.row_mut(0).copy_from_slice(first.grid().row(0));
    let mut g = 1;
    for (rank, sol) in solutions.iter().enumerate() {
        let grid = sol.grid();
        if sol.topology().rank() != rank {
            return Err(SolverError::InvalidConfig(format!(
                "solution {rank} belongs to rank {}",
                sol.topology().rank()
            )));
        }
        if grid.cols() != cols {
            return Err(SolverError::ShapeMismatch {
                expected: cols,
                found: grid.cols(),
            });
        }
        for i in 1..=grid.rows() {
            global.row_mut(g).copy_from_slice(grid.row(i));
            g += 1;
        }
    }
    if let Some(last) = solutions.last() {
        let grid = last.grid();
        global.row_mut(rows + 1).copy_from_slice(grid.row(grid.rows() + 1));
    }
    Ok(global)
}
