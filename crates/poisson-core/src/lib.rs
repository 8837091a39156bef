//! # Poisson Core
//!
//! Finite-difference relaxation solvers for the Poisson equation
//! $\nabla^2\phi = -\rho/\epsilon$ on a regular 3D lattice with a fixed
//! (Dirichlet) boundary.
//!
//! ## Architecture
//!
//! A [`lattice::PoissonLattice`] holds the potential and the source term.
//! All update rules implement [`solver::RelaxationMethod`], a single-sweep
//! interface, and the [`solver::RelaxationDriver`] repeats sweeps until the
//! convergence measure drops below the requested precision.
//!
//! ## Modules
//!
//! - [`types`] — Parameters, algorithm/problem selectors, results.
//! - [`lattice`] — The potential lattice and its derivative queries.
//! - [`solver`] — Jacobi, Gauss-Seidel and SOR, plus the driver loop.
//! - [`fields`] — Per-site field samples and text dumps.

pub mod fields;
pub mod lattice;
pub mod solver;
pub mod types;
