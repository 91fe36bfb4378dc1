//! Re-export public algorithms.

pub mod communicator;
pub mod halo_exchange;
pub mod reduction;
pub mod stencil;
pub mod wire;

pub use halo_exchange::{ExchangeSchedule, exchange_halos};
pub use reduction::{ConvergenceState, global_norm, is_converged, local_norm};
pub use stencil::sweep;
