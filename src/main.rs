//! poisson-slab command-line interface.
//!
//! Solve from TOML configuration files:
//! ```sh
//! poisson-slab run job.toml --workers 4 --output out/
//! poisson-slab validate job.toml --workers 4
//! mpirun -n 4 poisson-slab mpi-run job.toml   # with --features mpi-support
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use poisson_slab::config::SolverConfig;
use poisson_slab::io::write_report;
use poisson_slab::solver::SolveReport;
use poisson_slab::worker_group::{assemble_global, run_local};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poisson-slab")]
#[command(about = "Slab-decomposed Jacobi solver for the 2-D Poisson equation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve with an in-process group of workers.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Number of workers; must divide the row count.
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
        /// Directory for the field dump, profiles and report.json.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration file without solving.
    Validate {
        config: PathBuf,
        #[arg(short, long, default_value_t = 1)]
        workers: usize,
    },
    /// Solve with one worker per MPI rank.
    #[cfg(feature = "mpi-support")]
    MpiRun {
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load(path: &PathBuf) -> anyhow::Result<SolverConfig> {
    SolverConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn print_summary(report: &SolveReport) {
    println!("status      = {:?}", report.status);
    println!("iterations  = {}", report.iterations);
    println!("global norm = {:.8e}", report.global_norm);
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            workers,
            output,
        } => {
            let job = load(&config)?;
            let solutions = run_local(&job, workers).context("solve failed")?;
            let grid = assemble_global(&solutions)?;
            let report = &solutions[0].report;
            print_summary(report);
            if let Some(dir) = output {
                write_report(&dir, &grid, report)
                    .with_context(|| format!("writing report to {}", dir.display()))?;
            }
        }
        Commands::Validate { config, workers } => {
            let job = load(&config)?;
            job.validate(workers).with_context(|| {
                format!("{} is not valid for {workers} workers", config.display())
            })?;
            println!(
                "{}: {}x{} grid, {} rows per worker",
                config.display(),
                job.rows,
                job.cols,
                job.rows / workers
            );
        }
        #[cfg(feature = "mpi-support")]
        Commands::MpiRun { config, output } => {
            use poisson_slab::algs::communicator::{Communicator, MpiComm};
            use poisson_slab::solver::solve;

            let job = load(&config)?;
            let comm = MpiComm::new()?;
            let solution = solve(&job, &comm).context("solve failed")?;
            if comm.rank() == 0 {
                print_summary(&solution.report);
            }
            if let Some(dir) = output {
                let dir = dir.join(format!("rank-{}", comm.rank()));
                write_report(&dir, solution.grid(), &solution.report)?;
            }
        }
    }
    Ok(())
}
