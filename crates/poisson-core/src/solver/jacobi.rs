//! Jacobi relaxation.
//!
//! Every new value is computed from the previous iteration only, which
//! makes the update independent of sweep order but requires a second
//! buffer. After each sweep the buffers swap roles.

use super::RelaxationMethod;
use crate::lattice::PoissonLattice;

/// Write the Jacobi update of `current` into `updated`.
///
/// `current` is not modified. Boundary sites of `updated` are not written,
/// so it must already carry the same boundary as `current` (a clone does).
///
/// # Returns
/// $\sum |\phi_{\text{updated}} - \phi_{\text{current}}|$ over interior sites.
pub fn jacobi_update(current: &PoissonLattice, updated: &mut PoissonLattice) -> f64 {
    debug_assert_eq!(current.extents(), updated.extents());

    let mut convergence = 0.0;
    for [i, j, k] in current.interior_sites() {
        let next = current.next_jacobi_value(i, j, k);
        *updated.value_at_mut(i, j, k) = next;
        convergence += (next - current.value_at(i, j, k)).abs();
    }
    convergence
}

/// Double-buffered Jacobi strategy.
///
/// The second buffer is refreshed from the lattice before every sweep, so
/// its boundary and source always match the lattice being relaxed. Only
/// the allocation is kept between sweeps.
#[derive(Debug, Default)]
pub struct Jacobi {
    buffer: Option<PoissonLattice>,
}

impl Jacobi {
    pub fn new() -> Self {
        Self { buffer: None }
    }
}

impl RelaxationMethod for Jacobi {
    fn sweep(&mut self, lattice: &mut PoissonLattice) -> f64 {
        let mut updated = match self.buffer.take() {
            Some(mut buffer) => {
                buffer.clone_from(lattice);
                buffer
            }
            None => lattice.clone(),
        };

        let convergence = jacobi_update(lattice, &mut updated);
        std::mem::swap(lattice, &mut updated);
        self.buffer = Some(updated);
        convergence
    }

    fn name(&self) -> &str {
        "Jacobi"
    }
}
