//! Integration tests for the relaxation solvers.
//!
//! - Fixed point of every rule with a uniform boundary and no source
//! - Jacobi and Gauss-Seidel agree on the solution
//! - SOR(ω = 1) reproduces the Gauss-Seidel trajectory
//! - 5×5×5 point charge: finite, reproducible, radially symmetric

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use poisson_core::fields::field_samples;
use poisson_core::lattice::PoissonLattice;
use poisson_core::solver::{GaussSeidel, Jacobi, RelaxationDriver, RelaxationMethod, Sor};
use poisson_core::types::{Algorithm, Problem, SolverParams};

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

fn noisy_uniform_lattice(boundary: f64, seed: u64) -> PoissonLattice {
    let mut lattice = PoissonLattice::new(6, 6, 6, 1.0, 1.0).unwrap();
    lattice.set_boundary(boundary);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    lattice.initialise(boundary, 0.1, &mut rng);
    lattice
}

fn point_charge_lattice(n: usize) -> PoissonLattice {
    let mut lattice = PoissonLattice::new(n, n, n, 1.0, 1.0).unwrap();
    lattice.set_point_charge_dist();
    lattice
}

fn max_abs_difference(a: &PoissonLattice, b: &PoissonLattice) -> f64 {
    a.potential()
        .iter()
        .zip(b.potential().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

// ─────────────────────────────────────────────────────────────
// Fixed point
// ─────────────────────────────────────────────────────────────

#[test]
fn test_all_methods_relax_to_uniform_boundary_value() {
    let boundary = 0.75;
    let methods: Vec<Box<dyn RelaxationMethod>> = vec![
        Box::new(Jacobi::new()),
        Box::new(GaussSeidel),
        Box::new(Sor::new(1.5)),
    ];

    for method in methods {
        let name = method.name().to_string();
        let mut lattice = noisy_uniform_lattice(boundary, 42);
        let mut driver = RelaxationDriver::new(method, 1e-8).with_max_iterations(10_000);
        let report = driver.solve(&mut lattice).unwrap();

        assert!(report.convergence < 1e-8, "{name}: measure {}", report.convergence);
        for &phi in lattice.potential().iter() {
            assert_abs_diff_eq!(phi, boundary, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_converged_lattice_is_left_unchanged() {
    let mut lattice = noisy_uniform_lattice(0.0, 3);
    let mut driver = RelaxationDriver::new(Box::new(GaussSeidel), 1e-14).with_max_iterations(10_000);
    driver.solve(&mut lattice).unwrap();

    let before = lattice.clone();
    let measure = GaussSeidel.sweep(&mut lattice);
    assert!(measure < 1e-14);
    assert!(max_abs_difference(&before, &lattice) < 1e-14);
}

#[test]
fn test_jacobi_driver_can_be_reused_on_a_new_problem() {
    let mut driver = RelaxationDriver::new(Box::new(Jacobi::new()), 1e-8).with_max_iterations(10_000);

    let mut first = PoissonLattice::new(6, 6, 6, 1.0, 1.0).unwrap();
    first.set_boundary(1.0);
    driver.solve(&mut first).unwrap();

    let mut reused = point_charge_lattice(6);
    let mut fresh = reused.clone();
    let reused_report = driver.solve(&mut reused).unwrap();
    let fresh_report = RelaxationDriver::new(Box::new(Jacobi::new()), 1e-8)
        .with_max_iterations(10_000)
        .solve(&mut fresh)
        .unwrap();

    assert_eq!(reused_report, fresh_report);
    assert_eq!(reused, fresh);
    assert_eq!(reused.value_at(0, 2, 2), 0.0);
}

// ─────────────────────────────────────────────────────────────
// Agreement between methods
// ─────────────────────────────────────────────────────────────

#[test]
fn test_jacobi_and_gauss_seidel_share_fixed_point() {
    let mut jacobi = point_charge_lattice(7);
    let mut gauss_seidel = jacobi.clone();

    let jacobi_report = RelaxationDriver::new(Box::new(Jacobi::new()), 1e-10)
        .with_max_iterations(50_000)
        .solve(&mut jacobi)
        .unwrap();
    let gs_report = RelaxationDriver::new(Box::new(GaussSeidel), 1e-10)
        .with_max_iterations(50_000)
        .solve(&mut gauss_seidel)
        .unwrap();

    assert!(max_abs_difference(&jacobi, &gauss_seidel) < 1e-7);
    assert!(
        gs_report.iterations < jacobi_report.iterations,
        "Gauss-Seidel ({}) should need fewer sweeps than Jacobi ({})",
        gs_report.iterations,
        jacobi_report.iterations
    );
}

#[test]
fn test_sor_unit_factor_matches_gauss_seidel_trajectory() {
    let mut gs_lattice = noisy_uniform_lattice(0.2, 9);
    gs_lattice.set_point_charge_dist();
    let mut sor_lattice = gs_lattice.clone();

    let mut gs_driver = RelaxationDriver::new(Box::new(GaussSeidel), 1e-6);
    let mut sor_driver = RelaxationDriver::new(Box::new(Sor::new(1.0)), 1e-6);

    let gs: Vec<f64> = gs_driver.sweeps(&mut gs_lattice).take(25).map(|s| s.convergence).collect();
    let sor: Vec<f64> = sor_driver.sweeps(&mut sor_lattice).take(25).map(|s| s.convergence).collect();

    assert_eq!(gs, sor);
    assert_eq!(gs_lattice, sor_lattice);
}

#[test]
fn test_over_relaxation_speeds_up_convergence() {
    let mut gs = point_charge_lattice(9);
    let mut sor = gs.clone();

    let gs_report = RelaxationDriver::new(Box::new(GaussSeidel), 1e-8)
        .with_max_iterations(50_000)
        .solve(&mut gs)
        .unwrap();
    let sor_report = RelaxationDriver::new(Box::new(Sor::new(1.5)), 1e-8)
        .with_max_iterations(50_000)
        .solve(&mut sor)
        .unwrap();

    assert!(sor_report.iterations < gs_report.iterations);
    assert!(max_abs_difference(&gs, &sor) < 1e-6);
}

// ─────────────────────────────────────────────────────────────
// End-to-end point charge
// ─────────────────────────────────────────────────────────────

fn solve_reference_point_charge() -> (PoissonLattice, usize) {
    let params = SolverParams {
        algorithm: Algorithm::Jacobi,
        problem: Problem::PointCharge,
        extents: [5, 5, 5],
        precision: 1e-6,
        max_iterations: Some(10_000),
        ..Default::default()
    };
    let [nx, ny, nz] = params.extents;
    let mut lattice =
        PoissonLattice::new(nx, ny, nz, params.permittivity, params.space_step).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    lattice.initialise(params.initial_value, params.noise, &mut rng);
    lattice.set_point_charge_dist();

    let report = RelaxationDriver::from_params(&params)
        .unwrap()
        .solve(&mut lattice)
        .unwrap();
    (lattice, report.iterations)
}

#[test]
fn test_point_charge_run_is_reproducible() {
    let (first, first_iterations) = solve_reference_point_charge();
    let (second, second_iterations) = solve_reference_point_charge();

    assert!(first_iterations > 1);
    assert_eq!(first_iterations, second_iterations);
    assert_eq!(first, second);
}

#[test]
fn test_point_charge_potential_is_radially_symmetric() {
    let (lattice, _) = solve_reference_point_charge();
    let samples = field_samples(&lattice, Problem::PointCharge);

    let centre = samples.iter().find(|s| s.radius == 0.0).unwrap();
    for a in &samples {
        assert!(a.potential <= centre.potential);
        for b in &samples {
            if (a.radius - b.radius).abs() < 1e-12 {
                assert_abs_diff_eq!(a.potential, b.potential, epsilon = 1e-9);
                assert_abs_diff_eq!(a.magnitude(), b.magnitude(), epsilon = 1e-9);
            }
        }
    }

    // The field points away from a positive charge.
    let e = lattice.electric_field(3, 2, 2);
    assert!(e[0] > 0.0);
    assert_abs_diff_eq!(e[1], 0.0, epsilon = 1e-12);
}
