//! Adjoint recurrence: gradient of the alignment value w.r.t. the cost matrix.

use rayon::prelude::*;

use crate::band::BandConstraint;
use crate::cost::CostView;
use crate::grid::Grid;
use crate::schedule::{Backend, diagonal_cells};

/// Adjoint mass flowing into cell `(i, j)` from its three successors.
///
/// Each exponential is the soft-assignment weight the forward pass gave to
/// this cell as a predecessor, re-derived from `R` and the padded cost grid
/// `D` instead of cached.
#[inline]
fn backward_cell(r: &Grid, d: &Grid, e: &Grid, gamma: f64, i: usize, j: usize) -> f64 {
    let rij = r.get(i, j);
    let a = ((r.get(i + 1, j) - rij - d.get(i + 1, j)) / gamma).exp();
    let b = ((r.get(i, j + 1) - rij - d.get(i, j + 1)) / gamma).exp();
    let c = ((r.get(i + 1, j + 1) - rij - d.get(i + 1, j + 1)) / gamma).exp();
    e.get(i + 1, j) * a + e.get(i, j + 1) * b + e.get(i + 1, j + 1) * c
}

/// Compute the gradient field for one batch element as a flat `n * m`
/// row-major vector, unscaled by any upstream gradient.
///
/// `r` is the grid produced by the matching forward call; it is cloned and
/// boundary-adjusted here, never mutated, so the caller's context stays
/// valid across repeated gradient extractions.
pub(crate) fn gradient(
    cost: CostView<'_>,
    r: &Grid,
    gamma: f64,
    band: BandConstraint,
    backend: Backend,
) -> Vec<f64> {
    let n = cost.rows();
    let m = cost.cols();

    // Padded cost grid: interior = cost, border zero.
    let mut d = Grid::filled(n, m, 0.0);
    for i in 1..=n {
        for j in 1..=m {
            d.set(i, j, cost.at(i - 1, j - 1));
        }
    }

    let mut r_adj = r.clone();
    let mut e = Grid::filled(n, m, 0.0);

    // Boundary setup. The row and column one past the terminal are forced
    // unreachable so the reverse recurrence cannot draw mass through an
    // unintended corner; the sentinel then carries the terminal value and
    // the unit seed.
    let (ti, tj) = band.terminal_cell(n, m);
    let value = r_adj.get(ti, tj);
    r_adj.fill_col(tj + 1, f64::NEG_INFINITY);
    r_adj.fill_row(ti + 1, f64::NEG_INFINITY);
    r_adj.set(ti + 1, tj + 1, value);
    e.set(ti + 1, tj + 1, 1.0);

    // Interior cells the forward pass never reached must not exchange
    // gradient mass: flip them to -inf so their exponential weights vanish.
    for i in 1..=n {
        for j in 1..=m {
            if r_adj.get(i, j) == f64::INFINITY {
                r_adj.set(i, j, f64::NEG_INFINITY);
            }
        }
    }

    match backend {
        Backend::Sequential => {
            for i in (1..=n).rev() {
                for j in band.column_range(i, m).rev() {
                    let mass = backward_cell(&r_adj, &d, &e, gamma, i, j);
                    e.set(i, j, mass);
                }
            }
        }
        Backend::Parallel => {
            for p in (2..=n + m).rev() {
                let active: Vec<(usize, usize)> = diagonal_cells(p, n, m)
                    .filter(|&(i, j)| band.contains(i, j))
                    .collect();
                let updates: Vec<(usize, usize, f64)> = active
                    .into_par_iter()
                    .map(|(i, j)| (i, j, backward_cell(&r_adj, &d, &e, gamma, i, j)))
                    .collect();
                for (i, j, mass) in updates {
                    e.set(i, j, mass);
                }
            }
        }
    }

    e.interior_to_vec()
}
