//! Wavefront scheduling shared by the forward and backward sweeps.
//!
//! All cells with `i + j == p` depend only on cells of neighbouring
//! diagonals, so a whole anti-diagonal can be evaluated concurrently as
//! long as successive diagonals are separated by a barrier. The sequential
//! backend degenerates to nested loops; the parallel backend fans each
//! diagonal out over rayon and publishes the results before moving on.

use crate::error::SoftDtwError;

/// Execution backend for the per-element grid sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Nested-loop sweep on the calling thread. Deterministic bit-for-bit.
    #[default]
    Sequential,

    /// Rayon-backed sweep: batch elements in parallel, and within each
    /// element every cell of an anti-diagonal computed concurrently with a
    /// barrier between diagonals.
    Parallel,
}

/// Widest anti-diagonal the parallel backend will cover per batch element.
///
/// Historically the thread-group capacity of throughput hardware; kept as
/// an explicit limit so oversized inputs fail loudly instead of silently
/// degrading to a different schedule.
pub const MAX_WAVEFRONT_WIDTH: usize = 1024;

/// Reject inputs the parallel backend cannot cover.
///
/// # Errors
///
/// Returns [`SoftDtwError::CapacityExceeded`] when `backend` is
/// [`Backend::Parallel`] and `max(n, m)` exceeds [`MAX_WAVEFRONT_WIDTH`].
pub(crate) fn check_capacity(backend: Backend, n: usize, m: usize) -> Result<(), SoftDtwError> {
    let width = n.max(m);
    if backend == Backend::Parallel && width > MAX_WAVEFRONT_WIDTH {
        return Err(SoftDtwError::CapacityExceeded {
            width,
            limit: MAX_WAVEFRONT_WIDTH,
        });
    }
    Ok(())
}

/// Interior cells on anti-diagonal `p` (where `p = i + j`) of an `n x m`
/// interior, 1-based, `i` ascending. Valid for `p` in `2..=n + m`.
pub(crate) fn diagonal_cells(
    p: usize,
    n: usize,
    m: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let lo = if p > m { p - m } else { 1 };
    let hi = n.min(p - 1);
    (lo..=hi).map(move |i| (i, p - i))
}
