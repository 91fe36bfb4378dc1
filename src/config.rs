//! TOML configuration of a solve.
//!
//! ```toml
//! rows = 100
//! cols = 100
//! spacing = 0.1
//! residual = 1e-2
//! max_iterations = 10000
//! exchange = "parity"
//!
//! [boundary]
//! left = 10.0
//!
//! [[initial]]
//! row = 1
//! col = 1
//! value = 10.0
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::algs::halo_exchange::ExchangeSchedule;
use crate::data::boundary::BoundaryValues;
use crate::solver_error::SolverError;
use crate::topology::WorkerTopology;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Value assigned to one global interior cell (1-based row and column).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    pub row: usize,
    pub col: usize,
    pub value: f32,
}

impl PointValue {
    pub fn new(row: usize, col: usize, value: f32) -> Self {
        Self { row, col, value }
    }
}

/// Parameters of one Jacobi solve, shared by every worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Interior rows of the whole domain; the decomposed axis.
    #[serde(default = "default_extent")]
    pub rows: usize,
    /// Interior columns of the whole domain.
    #[serde(default = "default_extent")]
    pub cols: usize,
    /// Grid spacing `h`.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Convergence threshold on the global squared-difference norm.
    #[serde(default = "default_residual")]
    pub residual: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub boundary: BoundaryValues,
    /// Non-zero cells of the initial interior.
    #[serde(default)]
    pub initial: Vec<PointValue>,
    /// Non-zero cells of the source term `rho`.
    #[serde(default)]
    pub source: Vec<PointValue>,
    #[serde(default)]
    pub exchange: ExchangeSchedule,
}

fn default_extent() -> usize {
    100
}
fn default_spacing() -> f64 {
    0.1
}
fn default_residual() -> f64 {
    1e-2
}
fn default_max_iterations() -> usize {
    10_000
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rows: default_extent(),
            cols: default_extent(),
            spacing: default_spacing(),
            residual: default_residual(),
            max_iterations: default_max_iterations(),
            boundary: BoundaryValues::default(),
            initial: Vec::new(),
            source: Vec::new(),
            exchange: ExchangeSchedule::default(),
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SolverError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `h²` in the grid's storage precision.
    #[inline]
    pub fn hsq(&self) -> f32 {
        let h = self.spacing as f32;
        h * h
    }

    /// Check every parameter against a group of `workers`.
    ///
    /// # Errors
    /// Any [`SolverError`] for which [`SolverError::is_config_error`] holds.
    pub fn validate(&self, workers: usize) -> Result<(), SolverError> {
        if self.cols == 0 {
            return Err(SolverError::InvalidConfig("grid must have columns".into()));
        }
        WorkerTopology::new(self.rows, workers, 0)?;
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "spacing must be positive and finite, got {}",
                self.spacing
            )));
        }
        let hsq = self.hsq();
        if !(hsq.is_finite() && hsq > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "spacing {} squares to {hsq} in single precision",
                self.spacing
            )));
        }
        if !(self.residual.is_finite() && self.residual > 0.0) {
            return Err(SolverError::InvalidConfig(format!(
                "residual must be positive and finite, got {}",
                self.residual
            )));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        let b = &self.boundary;
        if ![b.top, b.bottom, b.left, b.right].iter().all(|v| v.is_finite()) {
            return Err(SolverError::InvalidConfig(
                "boundary values must be finite".into(),
            ));
        }
        for (what, points) in [("initial", &self.initial), ("source", &self.source)] {
            for p in points {
                if p.row == 0 || p.row > self.rows || p.col == 0 || p.col > self.cols {
                    return Err(SolverError::InvalidConfig(format!(
                        "{what} cell ({}, {}) is outside the {}x{} interior",
                        p.row, p.col, self.rows, self.cols
                    )));
                }
                if !p.value.is_finite() {
                    return Err(SolverError::InvalidConfig(format!(
                        "{what} cell ({}, {}) has a non-finite value",
                        p.row, p.col
                    )));
                }
            }
        }
        Ok(())
    }
}
