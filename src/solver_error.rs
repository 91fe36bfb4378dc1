//! SolverError: Unified error type for poisson-slab public APIs
//!
//! Every fallible operation in the crate returns this error. Configuration
//! problems are caught before the first iteration; communication failures are
//! fatal to the whole worker group and are never retried.

use thiserror::Error;

/// Unified error type for solver operations.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A configuration value is out of its admissible range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The decomposed axis cannot be split evenly among the workers.
    #[error("Cannot split {rows} rows evenly across {workers} workers")]
    UnevenDecomposition { rows: usize, workers: usize },
    /// A rank outside `0..workers` was requested.
    #[error("Rank {rank} is out of range for a group of {workers} workers")]
    RankOutOfRange { rank: usize, workers: usize },
    /// A point-to-point message with `neighbor` could not complete.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The global norm reduction could not complete.
    #[error("All-reduce failed: {0}")]
    ReductionFailed(String),
    /// An in-process worker panicked; its group was aborted.
    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
    /// A buffer did not have the expected number of elements.
    #[error("Shape mismatch: expected {expected} elements, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    /// Reading a config or writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration file could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    /// A report could not be serialized.
    #[error("Report serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SolverError {
    /// Builds a [`SolverError::CommError`] from a plain message.
    pub fn comm(neighbor: usize, msg: impl Into<String>) -> Self {
        SolverError::CommError {
            neighbor,
            source: msg.into().into(),
        }
    }

    /// True for the errors that can only be raised before the first iteration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SolverError::InvalidConfig(_)
                | SolverError::UnevenDecomposition { .. }
                | SolverError::RankOutOfRange { .. }
                | SolverError::ConfigParse(_)
        )
    }
}
