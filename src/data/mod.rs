//! Field storage: the halo-framed grid, physical boundary values, and the
//! per-worker pair of Jacobi buffers.

pub mod boundary;
pub mod field;
pub mod grid;

pub use boundary::BoundaryValues;
pub use field::Field;
pub use grid::Grid;
