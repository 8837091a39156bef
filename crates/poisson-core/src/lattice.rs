//! The potential lattice.
//!
//! A [`PoissonLattice`] holds the scalar potential $\phi$ and the source term
//! $\rho$ on a regular $n_x \times n_y \times n_z$ grid with spacing $dx$.
//!
//! # Boundary convention
//!
//! Both fields are allocated at exactly the stated extents. Every site whose
//! index is `0` or `n - 1` along some axis is a boundary site and carries a
//! fixed (Dirichlet) value, zero unless [`PoissonLattice::set_boundary`] is
//! used. The relaxation rules only ever write interior sites, so the
//! boundary is constant for the lifetime of a solve.

use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView3};
use rand::Rng;
use thiserror::Error;

/// Errors raised while constructing a lattice.
#[derive(Debug, Error, PartialEq)]
pub enum LatticeError {
    #[error("Lattice extents must be positive, got {nx}x{ny}x{nz}")]
    InvalidExtents { nx: usize, ny: usize, nz: usize },
}

/// Lattice for relaxing the electrostatic (or magnetostatic vector)
/// potential towards a solution of the Poisson equation.
#[derive(Debug, PartialEq)]
pub struct PoissonLattice {
    permittivity: f64,
    dx: f64,
    potential: Array3<f64>,
    charge_density: Array3<f64>,
}

impl PoissonLattice {
    /// Create a zero-filled lattice.
    ///
    /// # Arguments
    /// * `nx`, `ny`, `nz` - Number of sites along each axis, boundary included.
    /// * `permittivity` - Permittivity $\epsilon$ in $\nabla^2\phi = -\rho/\epsilon$.
    /// * `dx` - Spatial discretisation step.
    pub fn new(
        nx: usize,
        ny: usize,
        nz: usize,
        permittivity: f64,
        dx: f64,
    ) -> Result<Self, LatticeError> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(LatticeError::InvalidExtents { nx, ny, nz });
        }

        Ok(Self {
            permittivity,
            dx,
            potential: Array3::zeros((nx, ny, nz)),
            charge_density: Array3::zeros((nx, ny, nz)),
        })
    }

    /// Set every interior site to `initial_value` plus uniform noise in
    /// `[-noise, noise]`.
    ///
    /// With `noise == 0` no random numbers are drawn, so the result does not
    /// depend on the generator state.
    pub fn initialise<R: Rng + ?Sized>(&mut self, initial_value: f64, noise: f64, rng: &mut R) {
        let noise = noise.abs();
        for [i, j, k] in self.interior_sites() {
            let offset = if noise > 0.0 {
                rng.gen_range(-noise..=noise)
            } else {
                0.0
            };
            self.potential[[i, j, k]] = initial_value + offset;
        }
    }

    /// Write `value` to every boundary site.
    pub fn set_boundary(&mut self, value: f64) {
        let (nx, ny, nz) = self.extents();
        for ((i, j, k), phi) in self.potential.indexed_iter_mut() {
            if is_boundary_index(i, nx) || is_boundary_index(j, ny) || is_boundary_index(k, nz) {
                *phi = value;
            }
        }
    }

    /// Source term at a site.
    pub fn charge_density(&self, i: usize, j: usize, k: usize) -> f64 {
        self.charge_density[[i, j, k]]
    }

    /// Overwrite the source term at a site.
    pub fn set_charge_density(&mut self, i: usize, j: usize, k: usize, charge: f64) {
        self.charge_density[[i, j, k]] = charge;
    }

    /// Place a single unit point charge at the centre of the lattice.
    pub fn set_point_charge_dist(&mut self) {
        let [cx, cy, cz] = self.centre();
        self.set_charge_density(cx, cy, cz, 1.0);
    }

    /// Place a unit line current along z through the centre of the xy-plane.
    pub fn set_line_current_dist(&mut self) {
        let [cx, cy, _] = self.centre();
        let (_, _, nz) = self.extents();
        for k in 0..nz {
            self.set_charge_density(cx, cy, k, 1.0);
        }
    }

    /// Potential at a site.
    #[inline]
    pub fn value_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.potential[[i, j, k]]
    }

    /// Mutable reference to the potential at a site.
    #[inline]
    pub fn value_at_mut(&mut self, i: usize, j: usize, k: usize) -> &mut f64 {
        &mut self.potential[[i, j, k]]
    }

    /// Six-neighbour finite-difference estimate of the potential at an
    /// interior site:
    ///
    /// $$\phi'_{ijk} = \frac{1}{6}\Bigl(\sum_{\text{nn}} \phi + \frac{dx^2}{\epsilon}\rho_{ijk}\Bigr)$$
    ///
    /// All three relaxation rules share this estimate.
    #[inline]
    pub fn next_jacobi_value(&self, i: usize, j: usize, k: usize) -> f64 {
        let phi = &self.potential;
        let neighbours = phi[[i + 1, j, k]]
            + phi[[i - 1, j, k]]
            + phi[[i, j + 1, k]]
            + phi[[i, j - 1, k]]
            + phi[[i, j, k + 1]]
            + phi[[i, j, k - 1]];
        let source = self.dx * self.dx / self.permittivity * self.charge_density[[i, j, k]];
        (neighbours + source) / 6.0
    }

    /// Electric field $\mathbf{E} = -\nabla\phi$ by central differences.
    ///
    /// Returns the zero vector at boundary sites.
    pub fn electric_field(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        if self.is_boundary(i, j, k) {
            return [0.0; 3];
        }
        let phi = &self.potential;
        let h = 2.0 * self.dx;
        [
            -(phi[[i + 1, j, k]] - phi[[i - 1, j, k]]) / h,
            -(phi[[i, j + 1, k]] - phi[[i, j - 1, k]]) / h,
            -(phi[[i, j, k + 1]] - phi[[i, j, k - 1]]) / h,
        ]
    }

    /// Magnetic field $\mathbf{B} = \nabla \times (0, 0, A_z)$ with the
    /// potential read as $A_z$.
    ///
    /// Returns the zero vector at boundary sites.
    pub fn magnetic_field(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        if self.is_boundary(i, j, k) {
            return [0.0; 3];
        }
        let a = &self.potential;
        let h = 2.0 * self.dx;
        [
            (a[[i, j + 1, k]] - a[[i, j - 1, k]]) / h,
            -(a[[i + 1, j, k]] - a[[i - 1, j, k]]) / h,
            0.0,
        ]
    }

    /// $\sum |\phi_1 - \phi_2|$ over the interior sites of two lattices of
    /// equal extents.
    pub fn difference(&self, other: &PoissonLattice) -> f64 {
        debug_assert_eq!(self.extents(), other.extents());
        self.interior_sites()
            .map(|[i, j, k]| (self.value_at(i, j, k) - other.value_at(i, j, k)).abs())
            .sum()
    }

    /// `(nx, ny, nz)`.
    pub fn extents(&self) -> (usize, usize, usize) {
        self.potential.dim()
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn permittivity(&self) -> f64 {
        self.permittivity
    }

    /// Integer-divided centre of the lattice.
    pub fn centre(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.extents();
        [nx / 2, ny / 2, nz / 2]
    }

    /// Whether a site lies on the fixed boundary.
    pub fn is_boundary(&self, i: usize, j: usize, k: usize) -> bool {
        let (nx, ny, nz) = self.extents();
        is_boundary_index(i, nx) || is_boundary_index(j, ny) || is_boundary_index(k, nz)
    }

    /// Read-only view of the whole potential, boundary included.
    pub fn potential(&self) -> ArrayView3<'_, f64> {
        self.potential.view()
    }

    /// Interior sites in update order: `i` outermost, `k` innermost.
    pub fn interior_sites(&self) -> InteriorSites {
        InteriorSites::new(self.extents())
    }
}

impl Clone for PoissonLattice {
    fn clone(&self) -> Self {
        Self {
            permittivity: self.permittivity,
            dx: self.dx,
            potential: self.potential.clone(),
            charge_density: self.charge_density.clone(),
        }
    }

    /// Copies every field, reusing the existing allocations when the
    /// extents already match.
    fn clone_from(&mut self, source: &Self) {
        self.permittivity = source.permittivity;
        self.dx = source.dx;
        self.potential.clone_from(&source.potential);
        self.charge_density.clone_from(&source.charge_density);
    }
}

impl Index<[usize; 3]> for PoissonLattice {
    type Output = f64;

    fn index(&self, index: [usize; 3]) -> &f64 {
        &self.potential[index]
    }
}

impl IndexMut<[usize; 3]> for PoissonLattice {
    fn index_mut(&mut self, index: [usize; 3]) -> &mut f64 {
        &mut self.potential[index]
    }
}

#[inline]
fn is_boundary_index(index: usize, extent: usize) -> bool {
    index == 0 || index + 1 >= extent
}

/// Iterator over the interior sites of a lattice.
///
/// Yields nothing when any extent is below 3.
#[derive(Debug, Clone)]
pub struct InteriorSites {
    extents: (usize, usize, usize),
    next: Option<[usize; 3]>,
}

impl InteriorSites {
    fn new(extents: (usize, usize, usize)) -> Self {
        let (nx, ny, nz) = extents;
        let next = (nx > 2 && ny > 2 && nz > 2).then_some([1, 1, 1]);
        Self { extents, next }
    }
}

impl Iterator for InteriorSites {
    type Item = [usize; 3];

    fn next(&mut self) -> Option<[usize; 3]> {
        let current = self.next?;
        let (nx, ny, nz) = self.extents;
        let [mut i, mut j, mut k] = current;

        k += 1;
        if k + 1 >= nz {
            k = 1;
            j += 1;
            if j + 1 >= ny {
                j = 1;
                i += 1;
            }
        }
        self.next = (i + 1 < nx).then_some([i, j, k]);

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_extent_rejected() {
        let err = PoissonLattice::new(4, 0, 4, 1.0, 1.0).unwrap_err();
        assert_eq!(err, LatticeError::InvalidExtents { nx: 4, ny: 0, nz: 4 });
    }

    #[test]
    fn test_interior_site_order_and_count() {
        let lattice = PoissonLattice::new(4, 5, 6, 1.0, 1.0).unwrap();
        let sites: Vec<_> = lattice.interior_sites().collect();
        assert_eq!(sites.len(), 2 * 3 * 4);
        assert_eq!(sites[0], [1, 1, 1]);
        assert_eq!(sites[1], [1, 1, 2]);
        assert_eq!(sites[4], [1, 2, 1]);
        assert_eq!(*sites.last().unwrap(), [2, 3, 4]);
        assert!(sites.iter().all(|&[i, j, k]| !lattice.is_boundary(i, j, k)));
    }

    #[test]
    fn test_small_lattice_has_no_interior() {
        let lattice = PoissonLattice::new(2, 5, 5, 1.0, 1.0).unwrap();
        assert_eq!(lattice.interior_sites().count(), 0);
    }

    #[test]
    fn test_initialise_leaves_boundary_untouched() {
        let mut lattice = PoissonLattice::new(5, 5, 5, 1.0, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        lattice.initialise(2.0, 0.5, &mut rng);

        for ((i, j, k), &phi) in lattice.potential().indexed_iter() {
            if lattice.is_boundary(i, j, k) {
                assert_eq!(phi, 0.0);
            } else {
                assert!((1.5..=2.5).contains(&phi), "phi({i},{j},{k}) = {phi}");
            }
        }
    }

    #[test]
    fn test_noise_free_initialise_is_exact() {
        let mut lattice = PoissonLattice::new(4, 4, 4, 1.0, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        lattice.initialise(0.25, 0.0, &mut rng);
        assert!(lattice
            .interior_sites()
            .all(|[i, j, k]| lattice.value_at(i, j, k) == 0.25));
    }

    #[test]
    fn test_point_charge_at_integer_centre() {
        let mut lattice = PoissonLattice::new(5, 6, 7, 1.0, 1.0).unwrap();
        lattice.set_point_charge_dist();
        assert_eq!(lattice.charge_density(2, 3, 3), 1.0);
        let total: f64 = (0..5)
            .flat_map(|i| (0..6).flat_map(move |j| (0..7).map(move |k| (i, j, k))))
            .map(|(i, j, k)| lattice.charge_density(i, j, k))
            .sum();
        assert_eq!(total, 1.0);
    }

    #[test]
    fn test_line_current_spans_z() {
        let mut lattice = PoissonLattice::new(5, 5, 4, 1.0, 1.0).unwrap();
        lattice.set_line_current_dist();
        for k in 0..4 {
            assert_eq!(lattice.charge_density(2, 2, k), 1.0);
        }
        assert_eq!(lattice.charge_density(1, 2, 1), 0.0);
    }

    #[test]
    fn test_next_jacobi_value_includes_source() {
        let mut lattice = PoissonLattice::new(3, 3, 3, 2.0, 0.5).unwrap();
        lattice.set_boundary(1.0);
        lattice.set_charge_density(1, 1, 1, 4.0);
        // (6 * 1 + 0.25 / 2 * 4) / 6
        assert_relative_eq!(lattice.next_jacobi_value(1, 1, 1), 6.5 / 6.0);
    }

    #[test]
    fn test_electric_field_of_linear_ramp() {
        let c = 0.75;
        let mut lattice = PoissonLattice::new(6, 5, 5, 1.0, 1.0).unwrap();
        for ((i, _, _), phi) in lattice.potential.indexed_iter_mut() {
            *phi = c * i as f64;
        }
        for [i, j, k] in lattice.interior_sites() {
            let e = lattice.electric_field(i, j, k);
            assert_relative_eq!(e[0], -c);
            assert_relative_eq!(e[1], 0.0);
            assert_relative_eq!(e[2], 0.0);
        }
        assert_eq!(lattice.electric_field(0, 2, 2), [0.0; 3]);
    }

    #[test]
    fn test_electric_field_scales_with_step() {
        let mut lattice = PoissonLattice::new(5, 5, 5, 1.0, 0.5).unwrap();
        for ((_, _, k), phi) in lattice.potential.indexed_iter_mut() {
            *phi = k as f64;
        }
        let e = lattice.electric_field(2, 2, 2);
        assert_relative_eq!(e[2], -2.0);
    }

    #[test]
    fn test_magnetic_field_is_curl_of_az() {
        let mut lattice = PoissonLattice::new(5, 5, 5, 1.0, 1.0).unwrap();
        // A_z = 2i + 3j
        for ((i, j, _), a) in lattice.potential.indexed_iter_mut() {
            *a = 2.0 * i as f64 + 3.0 * j as f64;
        }
        let b = lattice.magnetic_field(2, 2, 2);
        assert_relative_eq!(b[0], 3.0);
        assert_relative_eq!(b[1], -2.0);
        assert_eq!(b[2], 0.0);
        assert_eq!(lattice.magnetic_field(2, 4, 2), [0.0; 3]);
    }

    #[test]
    fn test_difference_ignores_boundary() {
        let a = PoissonLattice::new(4, 4, 4, 1.0, 1.0).unwrap();
        let mut b = a.clone();
        b.set_boundary(10.0);
        assert_eq!(a.difference(&b), 0.0);
        b[[1, 2, 1]] = -0.5;
        assert_relative_eq!(a.difference(&b), 0.5);
    }
}
