//! Accuracy regression tests for the soft-DTW engine.
//!
//! These tests pin the analytic behavior of the forward and backward
//! recurrences against independently computed references: the classical
//! min-plus DP, central finite differences, and exact closed forms for
//! single-path grids.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use softdtw::{Backend, CostBatch, SeriesBatch, SoftDtw, SquaredEuclidean};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn random_cost(seed: u64, batch: usize, n: usize, m: usize) -> CostBatch {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let data: Vec<f64> = (0..batch * n * m)
        .map(|_| rng.random_range(0.05..1.0))
        .collect();
    CostBatch::new(data, batch, n, m).expect("valid random cost batch")
}

/// Classical hard-DTW min-plus recurrence over a single cost matrix.
fn hard_dtw(cost: &[f64], n: usize, m: usize) -> f64 {
    let w = m + 1;
    let mut r = vec![f64::INFINITY; (n + 1) * (m + 1)];
    r[0] = 0.0;
    for i in 1..=n {
        for j in 1..=m {
            let d = cost[(i - 1) * m + (j - 1)];
            let best = r[(i - 1) * w + (j - 1)]
                .min(r[(i - 1) * w + j])
                .min(r[i * w + (j - 1)]);
            r[i * w + j] = d + best;
        }
    }
    r[n * w + m]
}

fn align_value(engine: &SoftDtw, data: &[f64], n: usize, m: usize) -> f64 {
    let cost = CostBatch::new(data.to_vec(), 1, n, m).expect("valid cost");
    engine.align(&cost).expect("align").value(0)
}

// ---------------------------------------------------------------------------
// a) convergence to the hard minimum
// ---------------------------------------------------------------------------

/// As gamma shrinks the soft value approaches the min-plus DP value from
/// below, with total slack bounded by (n + m) * gamma * ln 3.
#[test]
fn soft_value_converges_to_hard_minimum() {
    let (n, m) = (4, 4);
    let cost = random_cost(11, 1, n, m);
    let hard = hard_dtw(cost.as_slice(), n, m);

    for &gamma in &[1e-2, 1e-3, 1e-4] {
        let engine = SoftDtw::new(gamma).unwrap();
        let soft = engine.align(&cost).unwrap().value(0);
        let slack = (n + m) as f64 * gamma * 3.0_f64.ln();
        assert!(soft <= hard + 1e-12, "gamma {gamma}: soft {soft} > hard {hard}");
        assert!(
            hard - soft <= slack + 1e-9,
            "gamma {gamma}: slack {} exceeds bound {slack}",
            hard - soft
        );
    }
}

// ---------------------------------------------------------------------------
// b) single-path grids have exact closed forms
// ---------------------------------------------------------------------------

/// A 1 x M grid admits exactly one monotonic path, so the soft value equals
/// the plain cost sum and every gradient entry is 1.
#[test]
fn single_row_alignment_sums_costs() {
    let data = vec![0.3, 1.7, 0.2, 2.4, 0.9];
    let cost = CostBatch::new(data.clone(), 1, 1, 5).unwrap();
    let engine = SoftDtw::new(1.0).unwrap();

    let alignment = engine.align(&cost).unwrap();
    let total: f64 = data.iter().sum();
    assert_eq!(alignment.value(0), total);

    let grad = engine.gradient(&alignment, &[1.0]).unwrap();
    for (k, &g) in grad.as_slice().iter().enumerate() {
        assert!((g - 1.0).abs() < 1e-12, "entry {k}: {g}");
    }
}

// ---------------------------------------------------------------------------
// c) transpose invariance
// ---------------------------------------------------------------------------

/// The recurrence treats the two axes symmetrically: aligning the
/// transposed cost matrix yields the same value.
#[test]
fn transpose_invariance() {
    let (n, m) = (4, 5);
    let cost = random_cost(23, 1, n, m);
    let transposed: Vec<f64> = (0..m * n)
        .map(|k| cost.as_slice()[(k % n) * m + k / n])
        .collect();

    let engine = SoftDtw::new(0.5).unwrap();
    let a = engine.align(&cost).unwrap().value(0);
    let b = align_value(&engine, &transposed, m, n);
    assert!((a - b).abs() < 1e-9, "a = {a}, b = {b}");
}

// ---------------------------------------------------------------------------
// d) analytic gradient vs central finite differences
// ---------------------------------------------------------------------------

fn assert_gradient_matches_finite_differences(
    engine: &SoftDtw,
    base: &CostBatch,
    n: usize,
    m: usize,
    tol: f64,
) {
    let alignment = engine.align(base).unwrap();
    let grad = engine.gradient(&alignment, &[1.0]).unwrap();

    let eps = 1e-5;
    for k in 0..n * m {
        let mut plus = base.as_slice().to_vec();
        plus[k] += eps;
        let mut minus = base.as_slice().to_vec();
        minus[k] -= eps;
        let numeric =
            (align_value(engine, &plus, n, m) - align_value(engine, &minus, n, m)) / (2.0 * eps);
        let analytic = grad.as_slice()[k];
        assert!(
            (analytic - numeric).abs() < tol,
            "entry {k}: analytic {analytic} vs numeric {numeric}"
        );
    }
}

#[test]
fn gradient_matches_finite_differences() {
    let (n, m) = (3, 4);
    let engine = SoftDtw::new(1.0).unwrap();
    let cost = random_cost(7, 1, n, m);
    assert_gradient_matches_finite_differences(&engine, &cost, n, m, 1e-4);
}

/// The banded unequal-length case exercises the offset terminal: rows the
/// band cannot reach must show zero analytic *and* numeric gradient.
#[test]
fn banded_gradient_matches_finite_differences() {
    let (n, m) = (5, 3);
    let engine = SoftDtw::new(0.5).unwrap().with_sakoe_chiba(1);
    let cost = random_cost(13, 1, n, m);
    assert_gradient_matches_finite_differences(&engine, &cost, n, m, 1e-4);
}

// ---------------------------------------------------------------------------
// e) band radius 0 vs band wider than the grid
// ---------------------------------------------------------------------------

/// Radius 0 disables pruning; a band wider than the grid prunes nothing.
/// Both code paths must agree bit-for-bit on values and gradients.
#[test]
fn no_pruning_paths_are_bitwise_identical() {
    let (n, m) = (4, 6);
    let cost = random_cost(17, 2, n, m);
    let unconstrained = SoftDtw::new(0.8).unwrap();
    let wide = SoftDtw::new(0.8).unwrap().with_sakoe_chiba(n.max(m));

    let a = unconstrained.align(&cost).unwrap();
    let b = wide.align(&cost).unwrap();
    assert_eq!(a.values(), b.values());

    let ga = unconstrained.gradient(&a, &[1.0, 2.0]).unwrap();
    let gb = wide.gradient(&b, &[1.0, 2.0]).unwrap();
    assert_eq!(ga.as_slice(), gb.as_slice());
}

// ---------------------------------------------------------------------------
// f) unequal lengths under a narrow band
// ---------------------------------------------------------------------------

/// With n=3, m=5, radius 1 the band exits the grid at column 4, so the
/// alignment must behave exactly as if the cost matrix ended there: same
/// value, same gradient over the reachable columns, zero gradient beyond.
#[test]
fn narrow_band_terminal_matches_truncated_grid() {
    let (n, m) = (3, 5);
    let full = random_cost(29, 1, n, m);

    // First four columns of the same matrix.
    let truncated: Vec<f64> = (0..n)
        .flat_map(|i| full.as_slice()[i * m..i * m + 4].to_vec())
        .collect();
    let truncated = CostBatch::new(truncated, 1, n, 4).unwrap();

    let engine = SoftDtw::new(0.6).unwrap().with_sakoe_chiba(1);
    let a_full = engine.align(&full).unwrap();
    let a_trunc = engine.align(&truncated).unwrap();
    assert_eq!(a_full.values(), a_trunc.values());

    let g_full = engine.gradient(&a_full, &[1.0]).unwrap();
    let g_trunc = engine.gradient(&a_trunc, &[1.0]).unwrap();
    for i in 0..n {
        for j in 0..4 {
            assert_eq!(
                g_full.at(0, i, j),
                g_trunc.at(0, i, j),
                "cell ({i},{j}) differs from truncated grid"
            );
        }
        // The column the band cannot reach contributes nothing.
        assert_eq!(g_full.at(0, i, 4), 0.0, "row {i} column 4");
    }
}

// ---------------------------------------------------------------------------
// g) batch independence
// ---------------------------------------------------------------------------

/// A batch of two must equal the two elements run individually.
#[test]
fn batch_elements_are_independent() {
    let (n, m) = (4, 5);
    let both = random_cost(31, 2, n, m);
    let size = n * m;
    let first = CostBatch::new(both.as_slice()[..size].to_vec(), 1, n, m).unwrap();
    let second = CostBatch::new(both.as_slice()[size..].to_vec(), 1, n, m).unwrap();

    let engine = SoftDtw::new(0.9).unwrap();
    let batched = engine.align(&both).unwrap();
    let a = engine.align(&first).unwrap();
    let b = engine.align(&second).unwrap();
    assert_eq!(batched.value(0), a.value(0));
    assert_eq!(batched.value(1), b.value(0));

    let g_batched = engine.gradient(&batched, &[1.5, -2.0]).unwrap();
    let g_a = engine.gradient(&a, &[1.5]).unwrap();
    let g_b = engine.gradient(&b, &[-2.0]).unwrap();
    assert_eq!(g_batched.element(0), g_a.element(0));
    assert_eq!(g_batched.element(1), g_b.element(0));
}

// ---------------------------------------------------------------------------
// h) backend equivalence
// ---------------------------------------------------------------------------

/// Sequential and parallel scheduling agree on values and gradients across
/// representative shapes: small square, rectangular, and banded.
#[test]
fn sequential_and_parallel_backends_agree() {
    let shapes: &[(usize, usize, usize)] = &[(4, 4, 0), (3, 7, 0), (6, 6, 2)];

    for &(n, m, radius) in shapes {
        let cost = random_cost(37 + (n * m) as u64, 2, n, m);
        let sequential = SoftDtw::new(0.7).unwrap().with_sakoe_chiba(radius);
        let parallel = sequential.with_backend(Backend::Parallel);

        let a_seq = sequential.align(&cost).unwrap();
        let a_par = parallel.align(&cost).unwrap();
        for (s, p) in a_seq.values().iter().zip(a_par.values()) {
            assert!((s - p).abs() < 1e-6, "shape ({n},{m},{radius})");
        }

        let g_seq = sequential.gradient(&a_seq, &[1.0, 1.0]).unwrap();
        let g_par = parallel.gradient(&a_par, &[1.0, 1.0]).unwrap();
        for (s, p) in g_seq.as_slice().iter().zip(g_par.as_slice()) {
            assert!((s - p).abs() < 1e-6, "shape ({n},{m},{radius})");
        }
    }
}

// ---------------------------------------------------------------------------
// i) divergence properties
// ---------------------------------------------------------------------------

#[test]
fn divergence_is_symmetric() {
    let x = SeriesBatch::new(vec![1.0, 2.0, 3.0], 1, 3, 1).unwrap();
    let y = SeriesBatch::new(vec![1.0, 2.5, 2.0], 1, 3, 1).unwrap();
    let engine = SoftDtw::new(0.5).unwrap();
    let ab = engine.divergence(&x, &y, &SquaredEuclidean).unwrap();
    let ba = engine.divergence(&y, &x, &SquaredEuclidean).unwrap();
    assert!((ab.values()[0] - ba.values()[0]).abs() < 1e-9);
}

proptest! {
    /// Debiased divergence under squared-Euclidean cost is nonnegative.
    #[test]
    fn divergence_is_nonnegative_for_small_random_inputs(
        x in prop::collection::vec(-3.0f64..3.0, 1..12),
        y in prop::collection::vec(-3.0f64..3.0, 1..12),
        gamma in 0.1f64..2.0
    ) {
        let xs = SeriesBatch::new(x.clone(), 1, x.len(), 1).unwrap();
        let ys = SeriesBatch::new(y.clone(), 1, y.len(), 1).unwrap();
        let engine = SoftDtw::new(gamma).unwrap();
        let d = engine.divergence(&xs, &ys, &SquaredEuclidean).unwrap();
        prop_assert!(d.values()[0] >= -1e-9, "d = {}", d.values()[0]);
    }
}
