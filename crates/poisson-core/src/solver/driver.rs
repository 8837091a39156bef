//! The relaxation loop.
//!
//! [`Sweeps`] is an unbounded iterator of [`Sweep`] records: each `next()`
//! applies one sweep of the chosen method to the lattice. The driver
//! consumes it until the convergence measure drops strictly below the
//! requested precision. Nothing detects divergence, so a bad SOR factor
//! runs forever unless an iteration cap is set.

use log::{debug, info, trace};

use super::{RelaxationMethod, SolverError};
use crate::lattice::PoissonLattice;
use crate::types::{ConvergenceReport, SolverParams};

/// Result of a single sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// 1-based iteration count.
    pub iteration: usize,
    /// Convergence measure of this sweep.
    pub convergence: f64,
}

impl Sweep {
    pub fn is_converged(&self, precision: f64) -> bool {
        self.convergence < precision
    }
}

/// Unbounded iterator applying one sweep per item.
pub struct Sweeps<'a> {
    lattice: &'a mut PoissonLattice,
    method: &'a mut dyn RelaxationMethod,
    iteration: usize,
}

impl<'a> Sweeps<'a> {
    pub fn new(lattice: &'a mut PoissonLattice, method: &'a mut dyn RelaxationMethod) -> Self {
        Self {
            lattice,
            method,
            iteration: 0,
        }
    }
}

impl Iterator for Sweeps<'_> {
    type Item = Sweep;

    fn next(&mut self) -> Option<Sweep> {
        let convergence = self.method.sweep(self.lattice);
        self.iteration += 1;
        Some(Sweep {
            iteration: self.iteration,
            convergence,
        })
    }
}

/// Runs a relaxation method until convergence.
pub struct RelaxationDriver {
    method: Box<dyn RelaxationMethod>,
    precision: f64,
    max_iterations: Option<usize>,
    progress_interval: usize,
}

impl RelaxationDriver {
    /// Create a driver with no iteration cap and progress logged every
    /// 1000 iterations.
    pub fn new(method: Box<dyn RelaxationMethod>, precision: f64) -> Self {
        Self {
            method,
            precision,
            max_iterations: None,
            progress_interval: 1000,
        }
    }

    /// Build the driver described by `params`.
    pub fn from_params(params: &SolverParams) -> Result<Self, SolverError> {
        if params.precision.is_nan() || params.precision <= 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "precision must be positive, got {}",
                params.precision
            )));
        }

        let method = params.algorithm.build(params.sor_parameter);
        let mut driver = Self::new(method, params.precision)
            .with_progress_interval(params.progress_interval);
        driver.max_iterations = params.max_iterations;
        Ok(driver)
    }

    /// Stop with [`SolverError::ConvergenceFailure`] after `max_iterations`
    /// sweeps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Log progress every `interval` iterations; 0 disables progress logging.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Sweep iterator over `lattice` using this driver's method.
    pub fn sweeps<'a>(&'a mut self, lattice: &'a mut PoissonLattice) -> Sweeps<'a> {
        Sweeps::new(lattice, self.method.as_mut())
    }

    /// Relax `lattice` in place until the convergence measure falls below
    /// the precision.
    pub fn solve(&mut self, lattice: &mut PoissonLattice) -> Result<ConvergenceReport, SolverError> {
        self.solve_with_progress(lattice, |_| {})
    }

    /// As [`RelaxationDriver::solve`], calling `on_progress` every
    /// `progress_interval` iterations.
    ///
    /// A cap of zero runs no sweeps and fails immediately.
    pub fn solve_with_progress<F>(
        &mut self,
        lattice: &mut PoissonLattice,
        mut on_progress: F,
    ) -> Result<ConvergenceReport, SolverError>
    where
        F: FnMut(&Sweep),
    {
        let precision = self.precision;
        let cap = self.max_iterations.unwrap_or(usize::MAX);
        let progress_interval = self.progress_interval;
        let (nx, ny, nz) = lattice.extents();
        debug!(
            "Relaxing {}x{}x{} lattice with {} to precision {:e}",
            nx,
            ny,
            nz,
            self.method.name(),
            precision
        );

        let mut last: Option<Sweep> = None;
        for sweep in self.sweeps(lattice).take(cap) {
            trace!("iteration {}: {:e}", sweep.iteration, sweep.convergence);
            if progress_interval > 0 && sweep.iteration % progress_interval == 0 {
                info!("{} {}", sweep.iteration, sweep.convergence);
                on_progress(&sweep);
            }

            if sweep.is_converged(precision) {
                debug!(
                    "Converged after {} iterations (measure {:e})",
                    sweep.iteration, sweep.convergence
                );
                return Ok(ConvergenceReport {
                    iterations: sweep.iteration,
                    convergence: sweep.convergence,
                });
            }
            last = Some(sweep);
        }

        let (max_iter, residual) = last.map_or((0, f64::INFINITY), |s| (s.iteration, s.convergence));
        Err(SolverError::ConvergenceFailure { max_iter, residual })
    }
}
