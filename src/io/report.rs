//! Plain-text field dumps and a JSON summary.
//!
//! Values are written one per line with six decimals. The field dump walks
//! the whole framed grid row by row; the two profiles cut through the middle
//! column and the middle row, frame cells included.

use crate::data::grid::Grid;
use crate::solver::SolveReport;
use crate::solver_error::SolverError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Paths produced by [`write_report`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportFiles {
    pub field: PathBuf,
    pub column_profile: PathBuf,
    pub row_profile: PathBuf,
    pub summary: PathBuf,
}

fn write_values(path: &Path, values: impl IntoIterator<Item = f32>) -> Result<(), SolverError> {
    let mut w = BufWriter::new(File::create(path)?);
    for v in values {
        writeln!(w, "{v:.6}")?;
    }
    w.flush()?;
    Ok(())
}

/// Dump every cell of `grid`, frame included, row-major.
pub fn write_field(path: impl AsRef<Path>, grid: &Grid) -> Result<(), SolverError> {
    write_values(path.as_ref(), grid.as_slice().iter().copied())
}

/// Write the field, both profiles and `report.json` into `dir` (created if missing).
pub fn write_report(
    dir: impl AsRef<Path>,
    grid: &Grid,
    report: &SolveReport,
) -> Result<ReportFiles, SolverError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let files = ReportFiles {
        field: dir.join("field.dat"),
        column_profile: dir.join("column_profile.dat"),
        row_profile: dir.join("row_profile.dat"),
        summary: dir.join("report.json"),
    };

    write_field(&files.field, grid)?;
    let mid_col = grid.cols() / 2 + 1;
    write_values(
        &files.column_profile,
        (0..grid.rows() + 2).map(|i| grid.get(i, mid_col)),
    )?;
    let mid_row = grid.rows() / 2 + 1;
    write_values(&files.row_profile, grid.row(mid_row).iter().copied())?;

    let mut w = BufWriter::new(File::create(&files.summary)?);
    serde_json::to_writer_pretty(&mut w, report)?;
    w.flush()?;

    log::info!("wrote report to {}", dir.display());
    Ok(files)
}
