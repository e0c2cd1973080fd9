//! Soft-DTW engine facade: batched align / gradient / divergence.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::backward;
use crate::band::BandConstraint;
use crate::cost::{CostBatch, GradientBatch};
use crate::error::SoftDtwError;
use crate::forward;
use crate::grid::Grid;
use crate::metric::CostMetric;
use crate::schedule::{self, Backend};
use crate::series::SeriesBatch;

/// Immutable soft-DTW configuration. Thread-safe and copyable.
///
/// Construct via [`SoftDtw::new`], then chain `with_*` methods to override
/// defaults (unconstrained band, sequential backend).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftDtw {
    gamma: f64,
    band: BandConstraint,
    backend: Backend,
}

impl SoftDtw {
    /// Create an engine with the given smoothing temperature.
    ///
    /// Smaller `gamma` approaches the hard DTW minimum; larger values give
    /// a smoother, more diffuse alignment.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::InvalidGamma`] | `gamma` is zero, negative, NaN, or infinite |
    pub fn new(gamma: f64) -> Result<Self, SoftDtwError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(SoftDtwError::InvalidGamma { gamma });
        }
        Ok(Self {
            gamma,
            band: BandConstraint::Unconstrained,
            backend: Backend::Sequential,
        })
    }

    /// Restrict alignment paths to a Sakoe-Chiba band of the given radius
    /// (`0` disables pruning).
    #[must_use]
    pub fn with_sakoe_chiba(mut self, radius: usize) -> Self {
        self.band = BandConstraint::from_radius(radius);
        self
    }

    /// Select the execution backend for both sweeps.
    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Return the smoothing temperature.
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Return the band constraint.
    #[must_use]
    pub fn band(&self) -> BandConstraint {
        self.band
    }

    /// Return the execution backend.
    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Compute the soft-DTW alignment value for every batch element.
    ///
    /// Returns an [`Alignment`] holding the per-element values together
    /// with everything the backward pass needs; keep it around to call
    /// [`gradient`][SoftDtw::gradient] later.
    ///
    /// A value of `+inf` means the band admits no path for that element
    /// ("no valid alignment"), not a failure.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::CapacityExceeded`] | parallel backend and `max(N, M)` over the width limit |
    #[instrument(skip(self, cost), fields(batch = cost.batch_len(), n = cost.rows(), m = cost.cols()))]
    pub fn align(&self, cost: &CostBatch) -> Result<Alignment, SoftDtwError> {
        schedule::check_capacity(self.backend, cost.rows(), cost.cols())?;

        let grids: Vec<Grid> = match self.backend {
            Backend::Sequential => (0..cost.batch_len())
                .map(|b| forward::accumulate(cost.element(b), self.gamma, self.band, self.backend))
                .collect(),
            Backend::Parallel => (0..cost.batch_len())
                .into_par_iter()
                .map(|b| forward::accumulate(cost.element(b), self.gamma, self.band, self.backend))
                .collect(),
        };

        let (ti, tj) = self.band.terminal_cell(cost.rows(), cost.cols());
        let values: Vec<f64> = grids.iter().map(|g| g.get(ti, tj)).collect();
        debug!(terminal_i = ti, terminal_j = tj, "forward pass complete");

        Ok(Alignment {
            values,
            grids,
            cost: cost.clone(),
            gamma: self.gamma,
            band: self.band,
        })
    }

    /// Compute the gradient of every element's alignment value with respect
    /// to its cost matrix, scaled by the caller's upstream gradient.
    ///
    /// The context is read-only and may be reused for further gradient
    /// calls with different upstream values.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::ContextMismatch`] | engine gamma/band differ from the align call |
    /// | [`SoftDtwError::UpstreamLengthMismatch`] | `upstream.len() != batch` |
    /// | [`SoftDtwError::CapacityExceeded`] | parallel backend and `max(N, M)` over the width limit |
    #[instrument(skip(self, context, upstream), fields(batch = context.batch_len()))]
    pub fn gradient(
        &self,
        context: &Alignment,
        upstream: &[f64],
    ) -> Result<GradientBatch, SoftDtwError> {
        if self.gamma != context.gamma || self.band != context.band {
            return Err(SoftDtwError::ContextMismatch {
                ctx_gamma: context.gamma,
                ctx_radius: context.band.radius(),
                gamma: self.gamma,
                radius: self.band.radius(),
            });
        }
        if upstream.len() != context.batch_len() {
            return Err(SoftDtwError::UpstreamLengthMismatch {
                got: upstream.len(),
                expected: context.batch_len(),
            });
        }
        let (rows, cols) = (context.cost.rows(), context.cost.cols());
        schedule::check_capacity(self.backend, rows, cols)?;

        let scale = |b: usize| {
            let mut field = backward::gradient(
                context.cost.element(b),
                &context.grids[b],
                self.gamma,
                self.band,
                self.backend,
            );
            for g in &mut field {
                *g *= upstream[b];
            }
            field
        };

        let fields: Vec<Vec<f64>> = match self.backend {
            Backend::Sequential => (0..context.batch_len()).map(scale).collect(),
            Backend::Parallel => (0..context.batch_len()).into_par_iter().map(scale).collect(),
        };
        debug!("backward pass complete");

        let data: Vec<f64> = fields.into_iter().flatten().collect();
        Ok(GradientBatch::from_parts(
            data,
            context.batch_len(),
            rows,
            cols,
        ))
    }

    /// Compute the debiased soft-DTW divergence
    /// `D(x, y) - (D(x, x) + D(y, y)) / 2` for every batch element.
    ///
    /// Three independent alignments under the supplied metric; the returned
    /// [`Divergence`] keeps all three contexts so
    /// [`divergence_gradient`][SoftDtw::divergence_gradient] can
    /// differentiate the composition end-to-end.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::BatchSizeMismatch`] | `x` and `y` have different batch sizes |
    /// | [`SoftDtwError::FeatureDimMismatch`] | `x` and `y` have different feature dims |
    /// | [`SoftDtwError::CapacityExceeded`] | parallel backend and sequence length over the width limit |
    #[instrument(skip(self, x, y, metric), fields(batch = x.batch_len(), n = x.len(), m = y.len()))]
    pub fn divergence<C: CostMetric>(
        &self,
        x: &SeriesBatch,
        y: &SeriesBatch,
        metric: &C,
    ) -> Result<Divergence, SoftDtwError> {
        let xy = self.align(&CostBatch::pairwise(x, y, metric)?)?;
        let xx = self.align(&CostBatch::pairwise(x, x, metric)?)?;
        let yy = self.align(&CostBatch::pairwise(y, y, metric)?)?;

        let values: Vec<f64> = xy
            .values()
            .iter()
            .zip(xx.values())
            .zip(yy.values())
            .map(|((&d_xy, &d_xx), &d_yy)| d_xy - 0.5 * (d_xx + d_yy))
            .collect();

        Ok(Divergence { values, xy, xx, yy })
    }

    /// Gradients of the divergence with respect to all three cost matrices,
    /// scaled by the upstream gradient. The self-alignment terms carry the
    /// `-1/2` factor of the composition.
    ///
    /// # Errors
    ///
    /// Same conditions as [`gradient`][SoftDtw::gradient], applied to each
    /// of the three stored contexts.
    pub fn divergence_gradient(
        &self,
        context: &Divergence,
        upstream: &[f64],
    ) -> Result<DivergenceGradient, SoftDtwError> {
        let xy = self.gradient(&context.xy, upstream)?;
        let half: Vec<f64> = upstream.iter().map(|u| -0.5 * u).collect();
        let xx = self.gradient(&context.xx, &half)?;
        let yy = self.gradient(&context.yy, &half)?;
        Ok(DivergenceGradient { xy, xx, yy })
    }
}

/// Result of an [`align`][SoftDtw::align] call: per-element values plus the
/// opaque state the backward pass replays. Immutable once returned.
#[derive(Debug, Clone)]
pub struct Alignment {
    values: Vec<f64>,
    grids: Vec<Grid>,
    cost: CostBatch,
    gamma: f64,
    band: BandConstraint,
}

impl Alignment {
    /// Per-element alignment values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Alignment value of batch element `b`.
    ///
    /// # Panics
    ///
    /// Panics if `b` is out of range.
    #[must_use]
    pub fn value(&self, b: usize) -> f64 {
        self.values[b]
    }

    /// Number of batch elements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.values.len()
    }
}

/// Result of a [`divergence`][SoftDtw::divergence] call.
#[derive(Debug, Clone)]
pub struct Divergence {
    values: Vec<f64>,
    xy: Alignment,
    xx: Alignment,
    yy: Alignment,
}

impl Divergence {
    /// Per-element divergence values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of batch elements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.values.len()
    }

    /// The cross-alignment context `D(x, y)`.
    #[must_use]
    pub fn cross(&self) -> &Alignment {
        &self.xy
    }

    /// The self-alignment context `D(x, x)`.
    #[must_use]
    pub fn self_x(&self) -> &Alignment {
        &self.xx
    }

    /// The self-alignment context `D(y, y)`.
    #[must_use]
    pub fn self_y(&self) -> &Alignment {
        &self.yy
    }
}

/// Gradients of the divergence with respect to its three cost matrices.
#[derive(Debug, Clone)]
pub struct DivergenceGradient {
    /// Gradient w.r.t. the cross cost matrix `cost(x, y)`.
    pub xy: GradientBatch,
    /// Gradient w.r.t. the self cost matrix `cost(x, x)`, scaled by -1/2.
    pub xx: GradientBatch,
    /// Gradient w.r.t. the self cost matrix `cost(y, y)`, scaled by -1/2.
    pub yy: GradientBatch,
}
