//! Derived fields and text output of the lattice state.
//!
//! Every writer emits one line per lattice site, ordered with `k`
//! outermost and `i` innermost. A blank line follows every row of constant
//! `j` and another follows every plane of constant `k`, which is the block
//! layout gnuplot's `splot` expects.
//!
//! The combined dump ([`write_field_dump`]) carries, per site:
//!
//! ```text
//! i j k r phi Fx Fy Fz |F|
//! ```
//!
//! where `r` is the distance in grid units from the integer-divided centre
//! and `F` is the electric field for [`Problem::PointCharge`] or the
//! magnetic field for [`Problem::CurrentWire`].

use std::io::{self, Write};

use serde::Serialize;

use crate::lattice::PoissonLattice;
use crate::types::Problem;

/// Everything the combined dump records about one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSample {
    pub index: [usize; 3],
    /// Distance from the lattice centre in grid units.
    pub radius: f64,
    pub potential: f64,
    pub field: [f64; 3],
}

impl FieldSample {
    /// Euclidean norm of the field.
    pub fn magnitude(&self) -> f64 {
        norm(&self.field)
    }
}

/// Derived field at a site for the given problem.
pub fn field_at(lattice: &PoissonLattice, problem: Problem, i: usize, j: usize, k: usize) -> [f64; 3] {
    match problem {
        Problem::PointCharge => lattice.electric_field(i, j, k),
        Problem::CurrentWire => lattice.magnetic_field(i, j, k),
    }
}

/// Sample every site in dump order (`k` outermost, `i` innermost).
pub fn field_samples(lattice: &PoissonLattice, problem: Problem) -> Vec<FieldSample> {
    let (nx, ny, nz) = lattice.extents();
    let centre = lattice.centre().map(|c| c as f64);

    let mut samples = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let offset = [
                    centre[0] - i as f64,
                    centre[1] - j as f64,
                    centre[2] - k as f64,
                ];
                samples.push(FieldSample {
                    index: [i, j, k],
                    radius: norm(&offset),
                    potential: lattice.value_at(i, j, k),
                    field: field_at(lattice, problem, i, j, k),
                });
            }
        }
    }
    samples
}

/// Write the combined `i j k r phi Fx Fy Fz |F|` dump.
pub fn write_field_dump<W: Write>(lattice: &PoissonLattice, problem: Problem, out: &mut W) -> io::Result<()> {
    let centre = lattice.centre().map(|c| c as f64);
    write_blocks(lattice, out, |out, i, j, k| {
        let offset = [
            centre[0] - i as f64,
            centre[1] - j as f64,
            centre[2] - k as f64,
        ];
        let field = field_at(lattice, problem, i, j, k);
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {}",
            i,
            j,
            k,
            norm(&offset),
            lattice.value_at(i, j, k),
            field[0],
            field[1],
            field[2],
            norm(&field)
        )
    })
}

/// Write the potential alone as `i j k phi`.
pub fn write_potential<W: Write>(lattice: &PoissonLattice, out: &mut W) -> io::Result<()> {
    write_blocks(lattice, out, |out, i, j, k| {
        writeln!(out, "{} {} {} {}", i, j, k, lattice.value_at(i, j, k))
    })
}

/// Write the electric field alone as `i j k Ex Ey Ez`.
pub fn write_electric_field<W: Write>(lattice: &PoissonLattice, out: &mut W) -> io::Result<()> {
    write_blocks(lattice, out, |out, i, j, k| {
        let e = lattice.electric_field(i, j, k);
        writeln!(out, "{} {} {} {} {} {}", i, j, k, e[0], e[1], e[2])
    })
}

fn write_blocks<W, F>(lattice: &PoissonLattice, out: &mut W, mut line: F) -> io::Result<()>
where
    W: Write,
    F: FnMut(&mut W, usize, usize, usize) -> io::Result<()>,
{
    let (nx, ny, nz) = lattice.extents();
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                line(out, i, j, k)?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
