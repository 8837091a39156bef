//! In-place relaxation: Gauss-Seidel and successive over-relaxation.
//!
//! Sites are updated in place in the order `i`, `j`, `k` (innermost), so a
//! site already sees the new values of the neighbours visited before it in
//! the same sweep. SOR extrapolates the Gauss-Seidel step:
//!
//! $$\phi_{\text{new}} = (1 - \omega)\,\phi_{\text{old}} + \omega\,\phi_{\text{GS}}$$
//!
//! With $\omega = 1$ the two coincide. For $\omega \notin (0, 2)$ the
//! iteration does not converge.

use super::RelaxationMethod;
use crate::lattice::PoissonLattice;

/// One Gauss-Seidel sweep over the interior of `lattice`.
///
/// # Returns
/// $\sum |\phi_{\text{new}} - \phi_{\text{old}}|$ accumulated during the sweep.
pub fn gauss_seidel_update(lattice: &mut PoissonLattice) -> f64 {
    let mut convergence = 0.0;
    for [i, j, k] in lattice.interior_sites() {
        let updated = lattice.next_jacobi_value(i, j, k);
        let site = lattice.value_at_mut(i, j, k);
        convergence += (updated - *site).abs();
        *site = updated;
    }
    convergence
}

/// One successive over-relaxation sweep with factor `sor_parameter` (ω).
pub fn sor_update(sor_parameter: f64, lattice: &mut PoissonLattice) -> f64 {
    let mut convergence = 0.0;
    for [i, j, k] in lattice.interior_sites() {
        let gauss_seidel = lattice.next_jacobi_value(i, j, k);
        let site = lattice.value_at_mut(i, j, k);
        let current = *site;
        let updated = (1.0 - sor_parameter) * current + sor_parameter * gauss_seidel;
        *site = updated;
        convergence += (updated - current).abs();
    }
    convergence
}

/// In-place Gauss-Seidel strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct GaussSeidel;

impl RelaxationMethod for GaussSeidel {
    fn sweep(&mut self, lattice: &mut PoissonLattice) -> f64 {
        gauss_seidel_update(lattice)
    }

    fn name(&self) -> &str {
        "Gauss-Seidel"
    }
}

/// Successive over-relaxation strategy.
#[derive(Debug, Clone, Copy)]
pub struct Sor {
    /// Over-relaxation factor ω.
    pub omega: f64,
}

impl Sor {
    pub fn new(omega: f64) -> Self {
        Self { omega }
    }
}

impl RelaxationMethod for Sor {
    fn sweep(&mut self, lattice: &mut PoissonLattice) -> f64 {
        sor_update(self.omega, lattice)
    }

    fn name(&self) -> &str {
        "SOR"
    }
}
