//! Core types shared across the solver.
//!
//! This module defines the parameter and result containers passed between
//! the relaxation driver and whatever front end configures it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::{GaussSeidel, Jacobi, RelaxationMethod, Sor};

/// Relaxation algorithm used to converge the potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Double-buffered update from the previous iteration only.
    #[default]
    Jacobi,
    /// In-place update that reads already-updated neighbours.
    GaussSeidel,
    /// Gauss-Seidel blended with the old value by the SOR factor.
    Sor,
}

impl Algorithm {
    /// Build the update strategy for this algorithm.
    ///
    /// `sor_parameter` is only consulted for [`Algorithm::Sor`].
    pub fn build(self, sor_parameter: f64) -> Box<dyn RelaxationMethod> {
        match self {
            Algorithm::Jacobi => Box::new(Jacobi::new()),
            Algorithm::GaussSeidel => Box::new(GaussSeidel),
            Algorithm::Sor => Box::new(Sor::new(sor_parameter)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Jacobi => write!(f, "Jacobi"),
            Algorithm::GaussSeidel => write!(f, "Gauss-Seidel"),
            Algorithm::Sor => write!(f, "SOR"),
        }
    }
}

/// Physical problem being solved, which fixes the source term and the
/// field derived from the converged potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Problem {
    /// Unit point charge at the centre; derive $\mathbf{E} = -\nabla\phi$.
    #[default]
    PointCharge,
    /// Unit line current along z through the centre; derive
    /// $\mathbf{B} = \nabla \times A_z\hat{\mathbf{z}}$.
    CurrentWire,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::PointCharge => write!(f, "Point-charge"),
            Problem::CurrentWire => write!(f, "Current-wire"),
        }
    }
}

/// Parameters defining a relaxation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Relaxation algorithm.
    pub algorithm: Algorithm,
    /// Source term and derived field.
    pub problem: Problem,
    /// Spatial discretisation step `dx`.
    pub space_step: f64,
    /// Permittivity in the Poisson equation.
    pub permittivity: f64,
    /// Initial value of the potential away from the boundary.
    pub initial_value: f64,
    /// Maximum magnitude of the uniform initial noise.
    pub noise: f64,
    /// The loop stops once the convergence measure falls below this.
    pub precision: f64,
    /// Grid extents `[nx, ny, nz]`, boundary sites included.
    pub extents: [usize; 3],
    /// Over-relaxation factor ω, used by SOR only.
    pub sor_parameter: f64,
    /// Seed for the noise generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Optional iteration cap. `None` runs until convergence.
    pub max_iterations: Option<usize>,
    /// Log a progress line every this many iterations (0 disables).
    pub progress_interval: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Jacobi,
            problem: Problem::PointCharge,
            space_step: 1.0,
            permittivity: 1.0,
            initial_value: 0.0,
            noise: 0.0,
            precision: 1e-3,
            extents: [100, 100, 100],
            sor_parameter: 1.0,
            seed: None,
            max_iterations: None,
            progress_interval: 1000,
        }
    }
}

/// Outcome of a converged relaxation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Number of sweeps performed, the converging one included.
    pub iterations: usize,
    /// Convergence measure of the final sweep.
    pub convergence: f64,
}
