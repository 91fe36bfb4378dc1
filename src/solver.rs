//! The per-worker Jacobi driver.
//!
//! Every worker of a group runs [`solve`] with the same [`SolverConfig`] and
//! its own communicator. One iteration is: sweep, reduce the norm, swap the
//! buffers, exchange halos. Because every worker sees the same reduced norm
//! and the same iteration count, all of them reach the same terminal state in
//! the same iteration.
//!
//! ```text
//! Initializing ──> Iterating ──┬──> Converged
//!                     ^  │     └──> IterationLimitReached
//!                     └──┘
//! ```

use crate::algs::communicator::Communicator;
use crate::algs::halo_exchange::exchange_halos;
use crate::algs::reduction::{ConvergenceState, global_norm, is_converged, local_norm};
use crate::algs::stencil::sweep;
use crate::config::SolverConfig;
use crate::data::field::Field;
use crate::data::grid::Grid;
use crate::solver_error::SolverError;
use crate::topology::WorkerTopology;
use serde::{Deserialize, Serialize};

/// Where a solver is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverState {
    Initializing,
    Iterating,
    Converged,
    IterationLimitReached,
}

impl SolverState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SolverState::Converged | SolverState::IterationLimitReached
        )
    }
}

/// How a finished solve ended. Non-convergence is a normal outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Converged,
    IterationLimitReached,
}

/// Summary handed to the reporting side once a solve is finished.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Global squared-difference norm of the last iteration.
    pub global_norm: f64,
    pub iterations: usize,
    /// Global norm of every iteration, in order.
    pub norm_history: Vec<f64>,
}

impl SolveReport {
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }
}

/// Final field of one worker plus the group-wide report.
#[derive(Clone, Debug)]
pub struct Solution {
    pub field: Field,
    pub report: SolveReport,
}

impl Solution {
    /// Final state buffer, halos included.
    pub fn grid(&self) -> &Grid {
        self.field.current()
    }

    pub fn topology(&self) -> &WorkerTopology {
        self.field.topology()
    }
}

/// Jacobi relaxation of one worker's slab.
pub struct JacobiSolver<'a, C: Communicator> {
    config: &'a SolverConfig,
    comm: &'a C,
    hsq: f32,
    field: Field,
    convergence: ConvergenceState,
    state: SolverState,
    history: Vec<f64>,
}

impl<'a, C: Communicator> JacobiSolver<'a, C> {
    /// Validate `config` for `comm`'s group, allocate and seed the field, and
    /// fill the halos once so that non-zero initial rows are visible to
    /// neighbours on the first sweep.
    pub fn new(config: &'a SolverConfig, comm: &'a C) -> Result<Self, SolverError> {
        config.validate(comm.size())?;
        let topology = WorkerTopology::new(config.rows, comm.size(), comm.rank())?;
        let mut field = Field::new(topology, config.cols, &config.boundary)?;
        for p in &config.initial {
            field.seed_initial(p.row, p.col, p.value)?;
        }
        for p in &config.source {
            field.seed_source(p.row, p.col, p.value)?;
        }
        exchange_halos(field.current_mut(), &topology, comm, config.exchange)?;
        if comm.rank() == 0 {
            log::debug!(
                "initialized {}x{} grid over {} workers, slab height {}",
                config.rows,
                config.cols,
                comm.size(),
                topology.slab_height()
            );
        }
        Ok(Self {
            config,
            comm,
            hsq: config.hsq(),
            field,
            convergence: ConvergenceState::default(),
            state: SolverState::Iterating,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn convergence(&self) -> ConvergenceState {
        self.convergence
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Overwrite this worker's part of the source term from a function of
    /// global `(row, col)`, both 1-based. Every worker of the group must call
    /// it with the same function.
    pub fn fill_source(&mut self, f: impl FnMut(usize, usize) -> f32) {
        self.field.fill_source(f);
    }

    /// Run one iteration. A no-op once a terminal state is reached.
    pub fn step(&mut self) -> Result<SolverState, SolverError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let (current, next, rho) = self.field.sweep_buffers();
        sweep(current, next, rho, self.hsq)?;
        let local = local_norm(self.field.current(), self.field.next());
        let global = global_norm(self.comm, local)?;

        self.convergence.iteration += 1;
        self.convergence.global_norm = global;
        self.history.push(global);
        if self.comm.rank() == 0 {
            log::debug!(
                "iteration = {}, unorm = {:.8e}",
                self.convergence.iteration,
                global
            );
        }

        // The newest iterate becomes current even on the last iteration.
        self.field.swap();

        if is_converged(global, self.config.residual) {
            self.state = SolverState::Converged;
        } else if self.convergence.iteration >= self.config.max_iterations {
            self.state = SolverState::IterationLimitReached;
        } else {
            let topology = *self.field.topology();
            exchange_halos(
                self.field.current_mut(),
                &topology,
                self.comm,
                self.config.exchange,
            )?;
        }
        Ok(self.state)
    }

    /// Iterate to a terminal state and hand back the field and report.
    pub fn run(mut self) -> Result<Solution, SolverError> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        let status = match self.state {
            SolverState::Converged => SolveStatus::Converged,
            _ => SolveStatus::IterationLimitReached,
        };
        if self.comm.rank() == 0 {
            match status {
                SolveStatus::Converged => log::info!(
                    "converged after {} iterations, global norm {:.8e}",
                    self.convergence.iteration,
                    self.convergence.global_norm
                ),
                SolveStatus::IterationLimitReached => log::info!(
                    "no convergence within {} iterations, global norm {:.8e}",
                    self.convergence.iteration,
                    self.convergence.global_norm
                ),
            }
        }
        Ok(Solution {
            field: self.field,
            report: SolveReport {
                status,
                global_norm: self.convergence.global_norm,
                iterations: self.convergence.iteration,
                norm_history: self.history,
            },
        })
    }
}

/// Solve `config` on this worker of `comm`'s group.
pub fn solve<C: Communicator>(config: &SolverConfig, comm: &C) -> Result<Solution, SolverError> {
    JacobiSolver::new(config, comm)?.run()
}
