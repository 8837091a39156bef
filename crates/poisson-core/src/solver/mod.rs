//! Relaxation solvers for the lattice.
//!
//! The [`RelaxationMethod`] trait is the single interface the driver runs
//! against: one call performs one sweep over the interior and returns the
//! convergence measure $\sum |\phi_{\text{new}} - \phi_{\text{old}}|$.
//! Implementations:
//!
//! - [`Jacobi`] — reads only the previous iteration, so it double-buffers.
//! - [`GaussSeidel`] — updates in place; later sites see earlier updates.
//! - [`Sor`] — Gauss-Seidel blended with the old value by a factor ω.
//!
//! The strategy is picked once from an [`Algorithm`](crate::types::Algorithm)
//! and the outer loop lives in [`driver`].

pub mod driver;
pub mod gauss_seidel;
pub mod jacobi;

use thiserror::Error;

use crate::lattice::PoissonLattice;

pub use driver::{RelaxationDriver, Sweep, Sweeps};
pub use gauss_seidel::{gauss_seidel_update, sor_update, GaussSeidel, Sor};
pub use jacobi::{jacobi_update, Jacobi};

/// Errors that can occur during a relaxation solve.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("Solver failed to converge after {max_iter} iterations (residual: {residual:.2e})")]
    ConvergenceFailure { max_iter: usize, residual: f64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// One-iteration update strategy.
pub trait RelaxationMethod {
    /// Apply one sweep to `lattice` and return the convergence measure.
    ///
    /// On return `lattice` holds the updated potential.
    fn sweep(&mut self, lattice: &mut PoissonLattice) -> f64;

    /// Human-readable name of the method.
    fn name(&self) -> &str;
}
