//! Simulation runner: builds the lattice, relaxes it and writes the results.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use poisson_core::fields::{write_electric_field, write_field_dump, write_potential};
use poisson_core::lattice::PoissonLattice;
use poisson_core::solver::RelaxationDriver;
use poisson_core::types::{Algorithm, ConvergenceReport, Problem, SolverParams};

use crate::config::OutputConfig;

/// Width of the label column in the parameter and result tables.
const LABEL_WIDTH: usize = 30;

/// Results from a simulation run.
pub struct SimulationOutput {
    pub lattice: PoissonLattice,
    pub report: ConvergenceReport,
    pub elapsed: Duration,
}

/// Build, seed and relax a lattice as described by `params`.
pub fn run_simulation(params: &SolverParams) -> Result<SimulationOutput> {
    let start = Instant::now();
    let [nx, ny, nz] = params.extents;

    let mut lattice = PoissonLattice::new(nx, ny, nz, params.permittivity, params.space_step)?;

    let mut rng = match params.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    lattice.initialise(params.initial_value, params.noise, &mut rng);

    // The boundary stays at zero, so only the source needs setting.
    match params.problem {
        Problem::PointCharge => lattice.set_point_charge_dist(),
        Problem::CurrentWire => lattice.set_line_current_dist(),
    }

    let mut driver = RelaxationDriver::from_params(params)?;
    println!("Relaxing with {}...", driver.method_name());
    let report = driver
        .solve_with_progress(&mut lattice, |sweep| {
            println!("{} {}", sweep.iteration, sweep.convergence)
        })
        .with_context(|| format!("{} relaxation did not converge", params.algorithm))?;

    Ok(SimulationOutput {
        lattice,
        report,
        elapsed: start.elapsed(),
    })
}

/// Write the input parameters as a two-column table.
pub fn write_parameters<W: Write>(params: &SolverParams, output_dir: &Path, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Input-Parameters...")?;
    write_row(out, "Solution-method: ", params.algorithm)?;
    if params.algorithm == Algorithm::Sor {
        write_row(out, "SOR-parameter: ", params.sor_parameter)?;
    }
    write_row(out, "Problem: ", params.problem)?;
    write_row(out, "Spatial-discretisation: ", params.space_step)?;
    write_row(out, "Permittivity: ", params.permittivity)?;
    write_row(out, "Initial-value: ", params.initial_value)?;
    write_row(out, "Initial-noise: ", params.noise)?;
    write_row(out, "Convergence-precision: ", params.precision)?;
    write_row(out, "Domain-x-range: ", params.extents[0])?;
    write_row(out, "Domain-y-range: ", params.extents[1])?;
    write_row(out, "Domain-z-range: ", params.extents[2])?;
    if let Some(seed) = params.seed {
        write_row(out, "Noise-seed: ", seed)?;
    }
    write_row(out, "Output-directory: ", output_dir.display())?;
    Ok(())
}

/// Write the iteration count, final measure and run time.
pub fn write_results<W: Write>(report: &ConvergenceReport, elapsed: Duration, out: &mut W) -> std::io::Result<()> {
    write_row(out, "Number-of-iterations-until-convergence: ", report.iterations)?;
    write_row(out, "Final-convergence-measure: ", report.convergence)?;
    write_row(out, "Time-taken-to-execute(s): ", elapsed.as_secs_f64())?;
    writeln!(out)
}

fn write_row<W: Write, T: std::fmt::Display>(out: &mut W, label: &str, value: T) -> std::io::Result<()> {
    writeln!(out, "{:<width$}{}", label, value, width = LABEL_WIDTH)
}

/// Write `input.txt` into the output directory, creating it if needed.
pub fn write_input_file(params: &SolverParams, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    let path = output_dir.join("input.txt");
    let mut file = std::fs::File::create(&path)?;
    write_parameters(params, output_dir, &mut file)?;
    Ok(())
}

/// Write `poissonOutput.dat` and `results.txt`, plus whichever optional
/// files `options` asks for.
pub fn write_outputs(
    output: &SimulationOutput,
    params: &SolverParams,
    output_dir: &Path,
    options: &OutputConfig,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let dump_path = output_dir.join("poissonOutput.dat");
    write_data_file(&dump_path, |out| write_field_dump(&output.lattice, params.problem, out))?;
    println!("Field dump written to: {}", dump_path.display());

    if options.save_potential {
        let path = output_dir.join("potential.dat");
        write_data_file(&path, |out| write_potential(&output.lattice, out))?;
        println!("Potential written to: {}", path.display());
    }
    if options.save_electric_field {
        let path = output_dir.join("electricField.dat");
        write_data_file(&path, |out| write_electric_field(&output.lattice, out))?;
        println!("Electric field written to: {}", path.display());
    }

    let results_path = output_dir.join("results.txt");
    let mut results = std::fs::File::create(&results_path)?;
    write_results(&output.report, output.elapsed, &mut results)?;

    if options.save_json {
        let json_path = output_dir.join("results.json");
        write_results_json(output, params, &json_path)?;
    }
    Ok(())
}

fn write_data_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut std::io::BufWriter<std::fs::File>) -> std::io::Result<()>,
{
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    let mut out = std::io::BufWriter::new(file);
    write(&mut out)?;
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonResults<'a> {
    parameters: &'a SolverParams,
    report: &'a ConvergenceReport,
    elapsed_seconds: f64,
}

fn write_results_json(output: &SimulationOutput, params: &SolverParams, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonResults {
        parameters: params,
        report: &output.report,
        elapsed_seconds: output.elapsed.as_secs_f64(),
    })
    .map_err(|e| anyhow::anyhow!("JSON serialisation error: {}", e))?;
    std::fs::write(path, json)?;

    println!("Results (JSON) written to: {}", path.display());
    Ok(())
}
