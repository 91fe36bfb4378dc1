#![cfg_attr(docsrs, feature(doc_cfg))]
//! # poisson-slab
//!
//! poisson-slab solves the discretized 2-D Poisson equation
//! `∇²u = rho` by Jacobi relaxation on a grid whose rows are split into
//! equal slabs, one per worker. Each iteration every worker sweeps its own
//! slab, the workers agree on one global convergence norm, and neighbouring
//! slabs swap their boundary rows.
//!
//! ## Features
//! - Flat, halo-framed `f32` grids with fixed Dirichlet edges
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - Two deadlock-free halo exchange schedules (non-blocking and odd/even parity)
//! - Norms accumulated in `f64` and reduced identically on every worker
//! - Optional Rayon-parallel sweeps (`rayon` feature), bit-identical to serial
//!
//! ## Determinism
//!
//! The result of a solve depends only on its configuration. The per-cell
//! arithmetic does not depend on the decomposition, so final grids are
//! identical for any worker count that divides the row count; the reduced
//! norms agree to rounding.
//!
//! ## Usage
//! ```no_run
//! use poisson_slab::prelude::*;
//!
//! let config = SolverConfig::load("job.toml")?;
//! let solutions = run_local(&config, 4)?;
//! let grid = assemble_global(&solutions)?;
//! let report = &solutions[0].report;
//! println!("{:?} after {} iterations", report.status, report.iterations);
//! # let _ = grid;
//! # Ok::<(), poisson_slab::solver_error::SolverError>(())
//! ```
//!
//! With `--features mpi-support`, build an `MpiComm` and call [`solver::solve`]
//! on every rank instead.
//!
//! Only exact decompositions are supported: the number of rows must be a
//! multiple of the number of workers.

pub mod algs;
pub mod config;
pub mod data;
pub mod io;
pub mod solver;
pub mod solver_error;
pub mod topology;
pub mod worker_group;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::halo_exchange::ExchangeSchedule;
    pub use crate::config::{PointValue, SolverConfig};
    pub use crate::data::{BoundaryValues, Field, Grid};
    pub use crate::solver::{JacobiSolver, SolveReport, SolveStatus, Solution, SolverState, solve};
    pub use crate::solver_error::SolverError;
    pub use crate::topology::WorkerTopology;
    pub use crate::worker_group::{assemble_global, run_local};
}
