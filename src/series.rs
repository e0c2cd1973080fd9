//! Batched multivariate time series with validation guarantees.

use crate::error::SoftDtwError;

/// Owned, validated batch of multivariate time series: `batch` elements,
/// each `len` timesteps of `dims` features, stored row-major as
/// `data[b * len * dims + t * dims + d]`. Guaranteed non-empty with all
/// finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBatch {
    data: Vec<f64>,
    batch: usize,
    len: usize,
    dims: usize,
}

impl SeriesBatch {
    /// Create a new series batch, validating shape and finiteness.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SoftDtwError::EmptyBatch`] | `batch` is zero |
    /// | [`SoftDtwError::EmptyAxis`] | `len` or `dims` is zero |
    /// | [`SoftDtwError::ShapeMismatch`] | `data.len() != batch * len * dims` |
    /// | [`SoftDtwError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(
        data: Vec<f64>,
        batch: usize,
        len: usize,
        dims: usize,
    ) -> Result<Self, SoftDtwError> {
        if batch == 0 {
            return Err(SoftDtwError::EmptyBatch);
        }
        if len == 0 {
            return Err(SoftDtwError::EmptyAxis { axis: "time" });
        }
        if dims == 0 {
            return Err(SoftDtwError::EmptyAxis { axis: "feature" });
        }
        let expected = batch * len * dims;
        if data.len() != expected {
            return Err(SoftDtwError::ShapeMismatch {
                len: data.len(),
                batch,
                rows: len,
                cols: dims,
                expected,
            });
        }
        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(SoftDtwError::NonFiniteValue { index });
        }
        Ok(Self {
            data,
            batch,
            len,
            dims,
        })
    }

    /// Return the number of batch elements.
    #[must_use]
    pub fn batch_len(&self) -> usize {
        self.batch
    }

    /// Return the number of timesteps per element.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if the batch holds no values.
    ///
    /// A [`SeriesBatch`] constructed via [`SeriesBatch::new`] is never empty;
    /// provided to satisfy the `len_without_is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return the feature dimension.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Feature vector of element `b` at timestep `t`.
    #[inline]
    pub(crate) fn timestep(&self, b: usize, t: usize) -> &[f64] {
        let start = (b * self.len + t) * self.dims;
        &self.data[start..start + self.dims]
    }
}
