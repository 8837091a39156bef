//! TOML configuration deserialisation and command-line overrides.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Args;
use serde::Deserialize;

use poisson_core::types::{Algorithm, Problem, SolverParams};

/// Top-level job configuration.
#[derive(Debug, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Simulation parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub problem: Problem,
    #[serde(default = "default_one")]
    pub spatial_discretisation: f64,
    #[serde(default = "default_one")]
    pub permittivity: f64,
    #[serde(default)]
    pub initial_value: f64,
    #[serde(default)]
    pub noise: f64,
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_range")]
    pub x_range: usize,
    #[serde(default = "default_range")]
    pub y_range: usize,
    #[serde(default = "default_range")]
    pub z_range: usize,
    /// Over-relaxation factor ω, used only with `algorithm = "sor"`.
    #[serde(default = "default_one")]
    pub sor_parameter: f64,
    /// Noise seed. Omit to seed from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Abort after this many iterations. Omit to run until convergence.
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            problem: Problem::default(),
            spatial_discretisation: default_one(),
            permittivity: default_one(),
            initial_value: 0.0,
            noise: 0.0,
            precision: default_precision(),
            x_range: default_range(),
            y_range: default_range(),
            z_range: default_range(),
            sor_parameter: default_one(),
            seed: None,
            max_iterations: None,
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_one() -> f64 {
    1.0
}
fn default_precision() -> f64 {
    1e-3
}
fn default_range() -> usize {
    100
}
fn default_progress_interval() -> usize {
    1000
}

/// Output configuration.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Output directory. Defaults to `./output/<unix-timestamp>`.
    #[serde(default)]
    pub directory: Option<String>,
    /// Whether to also save the convergence report as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
    /// Also write `potential.dat` with the bare potential (default: false).
    #[serde(default)]
    pub save_potential: bool,
    /// Also write `electricField.dat` with the bare electric field (default: false).
    #[serde(default)]
    pub save_electric_field: bool,
}

impl OutputConfig {
    /// The configured directory, or a fresh timestamped one.
    pub fn resolve_directory(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => PathBuf::from(dir),
            None => {
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                PathBuf::from("./output").join(stamp.to_string())
            }
        }
    }
}

/// Command-line overrides for the configuration file.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Relaxation algorithm.
    #[arg(long, value_parser = parse_algorithm)]
    pub algorithm: Option<Algorithm>,
    /// Source term: point charge or current wire.
    #[arg(long, value_parser = parse_problem)]
    pub problem: Option<Problem>,
    /// Spatial discretisation step size.
    #[arg(short = 'x', long)]
    pub spatial_discretisation: Option<f64>,
    /// Permittivity in the Poisson equation.
    #[arg(short, long)]
    pub permittivity: Option<f64>,
    /// Initial value of the potential away from the boundary.
    #[arg(short = 'v', long)]
    pub initial_value: Option<f64>,
    /// Maximum magnitude of initial noise.
    #[arg(short, long)]
    pub noise: Option<f64>,
    /// Precision of convergence.
    #[arg(short = 'd', long)]
    pub precision: Option<f64>,
    /// Number of x points in the domain, boundary included.
    #[arg(short = 'r', long)]
    pub x_range: Option<usize>,
    /// Number of y points in the domain, boundary included.
    #[arg(short = 'c', long)]
    pub y_range: Option<usize>,
    /// Number of z points in the domain, boundary included.
    #[arg(short = 't', long)]
    pub z_range: Option<usize>,
    /// Parameter for the successive over-relaxation algorithm.
    #[arg(short = 'w', long)]
    pub sor_parameter: Option<f64>,
    /// Seed for the initial noise.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Abort after this many iterations.
    #[arg(long)]
    pub max_iterations: Option<usize>,
    /// Output directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Also write the convergence report as JSON.
    #[arg(long)]
    pub json: bool,
    /// Also write the potential alone to `potential.dat`.
    #[arg(long)]
    pub potential: bool,
    /// Also write the electric field alone to `electricField.dat`.
    #[arg(long)]
    pub electric_field: bool,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    match s.to_ascii_lowercase().as_str() {
        "jacobi" => Ok(Algorithm::Jacobi),
        "gauss-seidel" | "gauss_seidel" | "gs" => Ok(Algorithm::GaussSeidel),
        "sor" => Ok(Algorithm::Sor),
        other => Err(format!(
            "unknown algorithm '{other}'. Valid: jacobi, gauss-seidel, sor"
        )),
    }
}

fn parse_problem(s: &str) -> Result<Problem, String> {
    match s.to_ascii_lowercase().as_str() {
        "point-charge" | "electro" => Ok(Problem::PointCharge),
        "current-wire" | "magneto" => Ok(Problem::CurrentWire),
        other => Err(format!(
            "unknown problem '{other}'. Valid: point-charge, current-wire"
        )),
    }
}

impl JobConfig {
    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        let sim = &mut self.simulation;
        if let Some(v) = overrides.algorithm {
            sim.algorithm = v;
        }
        if let Some(v) = overrides.problem {
            sim.problem = v;
        }
        if let Some(v) = overrides.spatial_discretisation {
            sim.spatial_discretisation = v;
        }
        if let Some(v) = overrides.permittivity {
            sim.permittivity = v;
        }
        if let Some(v) = overrides.initial_value {
            sim.initial_value = v;
        }
        if let Some(v) = overrides.noise {
            sim.noise = v;
        }
        if let Some(v) = overrides.precision {
            sim.precision = v;
        }
        if let Some(v) = overrides.x_range {
            sim.x_range = v;
        }
        if let Some(v) = overrides.y_range {
            sim.y_range = v;
        }
        if let Some(v) = overrides.z_range {
            sim.z_range = v;
        }
        if let Some(v) = overrides.sor_parameter {
            sim.sor_parameter = v;
        }
        if overrides.seed.is_some() {
            sim.seed = overrides.seed;
        }
        if overrides.max_iterations.is_some() {
            sim.max_iterations = overrides.max_iterations;
        }
        if let Some(dir) = &overrides.output {
            self.output.directory = Some(dir.display().to_string());
        }
        if overrides.json {
            self.output.save_json = true;
        }
        if overrides.potential {
            self.output.save_potential = true;
        }
        if overrides.electric_field {
            self.output.save_electric_field = true;
        }
    }

    /// Reject parameters the solver cannot run with.
    ///
    /// An SOR factor outside (0, 2) is only warned about: the run is legal
    /// but will not converge.
    pub fn validate(&self) -> anyhow::Result<()> {
        let sim = &self.simulation;
        if sim.x_range == 0 || sim.y_range == 0 || sim.z_range == 0 {
            anyhow::bail!(
                "Domain ranges must be positive, got {}x{}x{}",
                sim.x_range,
                sim.y_range,
                sim.z_range
            );
        }
        if !is_positive(sim.spatial_discretisation) {
            anyhow::bail!(
                "Spatial discretisation must be positive, got {}",
                sim.spatial_discretisation
            );
        }
        if !is_positive(sim.permittivity) {
            anyhow::bail!("Permittivity must be positive, got {}", sim.permittivity);
        }
        if !is_positive(sim.precision) {
            anyhow::bail!("Precision must be positive, got {}", sim.precision);
        }
        if !(sim.noise.is_finite() && sim.noise >= 0.0) {
            anyhow::bail!("Noise must be non-negative, got {}", sim.noise);
        }
        if sim.algorithm == Algorithm::Sor && !(sim.sor_parameter > 0.0 && sim.sor_parameter < 2.0) {
            log::warn!(
                "SOR parameter {} is outside (0, 2); the iteration will not converge",
                sim.sor_parameter
            );
        }
        Ok(())
    }

    /// Solver parameters for the core.
    pub fn to_params(&self) -> SolverParams {
        let sim = &self.simulation;
        SolverParams {
            algorithm: sim.algorithm,
            problem: sim.problem,
            space_step: sim.spatial_discretisation,
            permittivity: sim.permittivity,
            initial_value: sim.initial_value,
            noise: sim.noise,
            precision: sim.precision,
            extents: [sim.x_range, sim.y_range, sim.z_range],
            sor_parameter: sim.sor_parameter,
            seed: sim.seed,
            max_iterations: sim.max_iterations,
            progress_interval: sim.progress_interval,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
    let config: JobConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse configuration '{}'", path.display()))?;
    Ok(config)
}
