//! Poisson solver command-line interface.
//!
//! Relax a point charge or current wire to convergence:
//! ```sh
//! poisson-cli run --algorithm sor -w 1.8 -r 50 -c 50 -t 50
//! poisson-cli run job.toml -o runs/job
//! poisson-cli validate job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::{JobConfig, Overrides};

#[derive(Parser)]
#[command(name = "poisson-cli")]
#[command(about = "Jacobi, Gauss-Seidel and SOR relaxation of the Poisson equation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation, optionally from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, overrides } => {
            println!("Poisson Relaxation Solver");
            println!("=========================");
            let mut job = match &config {
                Some(path) => {
                    println!("Configuration: {}", path.display());
                    config::load_config(path)?
                }
                None => JobConfig::default(),
            };
            job.apply_overrides(&overrides);
            job.validate()?;

            let params = job.to_params();
            let out_dir = job.output.resolve_directory();

            let mut table = Vec::new();
            runner::write_parameters(&params, &out_dir, &mut table)?;
            println!("{}", String::from_utf8_lossy(&table));
            runner::write_input_file(&params, &out_dir)?;

            let result = runner::run_simulation(&params)?;
            runner::write_outputs(&result, &params, &out_dir, &job.output)?;

            let mut summary = Vec::new();
            runner::write_results(&result.report, result.elapsed, &mut summary)?;
            print!("{}", String::from_utf8_lossy(&summary));
            println!("Simulation complete.");
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            job.validate()?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
    }
}
