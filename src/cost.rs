//! Batched pairwise cost matrices and gradient fields.

use crate::error::SoftDtwError;
use crate::metric::CostMetric;
use crate::series::SeriesBatch;

/// Owned, validated batch of pairwise cost matrices: `batch` elements, each
/// an `rows x cols` row-major matrix of finite reals, stored as
/// `data[b * rows * cols + i * cols + j]`. Immutable input to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBatch {
    data: Vec<f64>,
    batch: usize,
    rows: usize,
    cols: usize,
}

impl CostBatch {
    /// Create a cost batch from a flat buffer, validating shape and
    /// finiteness.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::EmptyBatch`] | `batch` is zero |
    /// | [`SoftDtwError::EmptyAxis`] | `rows` or `cols` is zero |
    /// | [`SoftDtwError::ShapeMismatch`] | `data.len() != batch * rows * cols` |
    /// | [`SoftDtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(
        data: Vec<f64>,
        batch: usize,
        rows: usize,
        cols: usize,
    ) -> Result<Self, SoftDtwError> {
        if batch == 0 {
            return Err(SoftDtwError::EmptyBatch);
        }
        if rows == 0 {
            return Err(SoftDtwError::EmptyAxis { axis: "row" });
        }
        if cols == 0 {
            return Err(SoftDtwError::EmptyAxis { axis: "column" });
        }
        let expected = batch * rows * cols;
        if data.len() != expected {
            return Err(SoftDtwError::ShapeMismatch {
                len: data.len(),
                batch,
                rows,
                cols,
                expected,
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(SoftDtwError::NonFiniteValue { index });
        }
        Ok(Self {
            data,
            batch,
            rows,
            cols,
        })
    }

    /// Build the batch of pairwise cost matrices between two series batches
    /// under the given metric: entry `(b, i, j)` is
    /// `metric.cost(x[b, i], y[b, j])`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::BatchSizeMismatch`] | `x` and `y` have different batch sizes |
    /// | [`SoftDtwError::FeatureDimMismatch`] | `x` and `y` have different feature dims |
    pub fn pairwise<C: CostMetric>(
        x: &SeriesBatch,
        y: &SeriesBatch,
        metric: &C,
    ) -> Result<Self, SoftDtwError> {
        if x.batch_len() != y.batch_len() {
            return Err(SoftDtwError::BatchSizeMismatch {
                x: x.batch_len(),
                y: y.batch_len(),
            });
        }
        if x.dims() != y.dims() {
            return Err(SoftDtwError::FeatureDimMismatch {
                x: x.dims(),
                y: y.dims(),
            });
        }

        let batch = x.batch_len();
        let rows = x.len();
        let cols = y.len();
        let mut data = Vec::with_capacity(batch * rows * cols);
        for b in 0..batch {
            for i in 0..rows {
                let xi = x.timestep(b, i);
                for j in 0..cols {
                    data.push(metric.cost(xi, y.timestep(b, j)));
                }
            }
        }
        Ok(Self {
            data,
            batch,
            rows,
            cols,
        })
    }

    /// Return the number of batch elements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch
    }

    /// Return the row count (length of the first sequence).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the column count (length of the second sequence).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return the flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Borrow the `b`-th element as a zero-copy matrix view.
    #[inline]
    pub(crate) fn element(&self, b: usize) -> CostView<'_> {
        let size = self.rows * self.cols;
        CostView {
            data: &self.data[b * size..(b + 1) * size],
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Borrowed `rows x cols` cost matrix for one batch element, 0-indexed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CostView<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
}

impl CostView<'_> {
    #[inline]
    pub(crate) fn at(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }
}

/// Gradient of the per-element alignment values with respect to a cost
/// batch. Same shape and layout as the [`CostBatch`] it differentiates.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBatch {
    data: Vec<f64>,
    batch: usize,
    rows: usize,
    cols: usize,
}

impl GradientBatch {
    pub(crate) fn from_parts(data: Vec<f64>, batch: usize, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), batch * rows * cols);
        Self {
            data,
            batch,
            rows,
            cols,
        }
    }

    /// Return the number of batch elements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch
    }

    /// Return the row count per element.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the column count per element.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return the flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Gradient entry for batch element `b` at cost coordinate `(i, j)`,
    /// 0-indexed.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn at(&self, b: usize, i: usize, j: usize) -> f64 {
        assert!(b < self.batch, "batch index {b} out of range {}", self.batch);
        assert!(i < self.rows, "row index {i} out of range {}", self.rows);
        assert!(j < self.cols, "column index {j} out of range {}", self.cols);
        self.data[(b * self.rows + i) * self.cols + j]
    }

    /// The `b`-th element's gradient field as a flat `rows * cols` slice.
    #[must_use]
    pub fn element(&self, b: usize) -> &[f64] {
        let size = self.rows * self.cols;
        &self.data[b * size..(b + 1) * size]
    }
}
