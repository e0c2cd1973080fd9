//! Forward soft-minimum accumulation over the padded cost grid.

use rayon::prelude::*;

use crate::band::BandConstraint;
use crate::cost::CostView;
use crate::grid::Grid;
use crate::schedule::{Backend, diagonal_cells};

/// Soft minimum of three accumulated costs at temperature `gamma`.
///
/// Evaluated in the log-sum-exp form with the maximum subtracted: the
/// direct exponentiation overflows for realistic cost magnitudes. When all
/// three predecessors are unreachable the result is `+inf`.
#[inline]
pub(crate) fn softmin3(gamma: f64, a: f64, b: f64, c: f64) -> f64 {
    let ra = -a / gamma;
    let rb = -b / gamma;
    let rc = -c / gamma;
    let rmax = ra.max(rb).max(rc);
    if !rmax.is_finite() {
        return f64::INFINITY;
    }
    let rsum = (ra - rmax).exp() + (rb - rmax).exp() + (rc - rmax).exp();
    -gamma * (rsum.ln() + rmax)
}

/// Accumulated cost of cell `(i, j)` given its three predecessors.
#[inline]
fn forward_cell(r: &Grid, cost: CostView<'_>, gamma: f64, i: usize, j: usize) -> f64 {
    cost.at(i - 1, j - 1)
        + softmin3(
            gamma,
            r.get(i - 1, j - 1),
            r.get(i - 1, j),
            r.get(i, j - 1),
        )
}

/// Fill the padded accumulated-cost grid for one batch element.
///
/// The grid starts at `+inf` everywhere except `R[0,0] = 0`; cells outside
/// the band are never written. Cell `(i, j)` depends only on cells of the
/// previous anti-diagonal, so any diagonal-consistent visit order produces
/// the same grid.
pub(crate) fn accumulate(
    cost: CostView<'_>,
    gamma: f64,
    band: BandConstraint,
    backend: Backend,
) -> Grid {
    let n = cost.rows();
    let m = cost.cols();
    let mut r = Grid::filled(n, m, f64::INFINITY);
    r.set(0, 0, 0.0);

    match backend {
        Backend::Sequential => {
            for i in 1..=n {
                for j in band.column_range(i, m) {
                    let value = forward_cell(&r, cost, gamma, i, j);
                    r.set(i, j, value);
                }
            }
        }
        Backend::Parallel => {
            for p in 2..=n + m {
                let active: Vec<(usize, usize)> = diagonal_cells(p, n, m)
                    .filter(|&(i, j)| band.contains(i, j))
                    .collect();
                let updates: Vec<(usize, usize, f64)> = active
                    .into_par_iter()
                    .map(|(i, j)| (i, j, forward_cell(&r, cost, gamma, i, j)))
                    .collect();
                // Barrier: publish the whole diagonal before the next one reads it.
                for (i, j, value) in updates {
                    r.set(i, j, value);
                }
            }
        }
    }

    r
}
