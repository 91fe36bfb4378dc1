//! Worker topology: how the domain's rows are shared out among ranks.

pub mod slab;

pub use slab::WorkerTopology;
