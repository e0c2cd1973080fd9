//! Per-timestep cost metrics for building pairwise cost matrices.

/// Pointwise cost between two feature vectors at one timestep pair.
///
/// The engine never picks a metric itself; callers choose one when building
/// a cost batch from raw series.
pub trait CostMetric {
    /// Cost between feature vectors `a` and `b` (equal length).
    fn cost(&self, a: &[f64], b: &[f64]) -> f64;
}

/// Squared Euclidean distance summed over feature dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl CostMetric for SquaredEuclidean {
    fn cost(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

/// RBF-kernel-derived cost: `sum_d 2 - 2 exp(-sigma (a_d - b_d)^2)`.
///
/// Bounded in `[0, 2 * dims)`, which keeps accumulated costs small for long
/// sequences compared to the unbounded squared distance.
#[derive(Debug, Clone, Copy)]
pub struct RbfCost {
    sigma: f64,
}

impl RbfCost {
    /// Create an RBF cost with the given kernel width.
    #[must_use]
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    /// Return the kernel width.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Default for RbfCost {
    fn default() -> Self {
        Self { sigma: 0.5 }
    }
}

impl CostMetric for RbfCost {
    fn cost(&self, a: &[f64], b: &[f64]) -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| 2.0 - 2.0 * (-self.sigma * (x - y).powi(2)).exp())
            .sum()
    }
}
