//! Writers for finished solves.

pub mod report;

pub use report::{ReportFiles, write_field, write_report};
