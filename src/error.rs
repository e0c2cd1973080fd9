//! Error types for soft-DTW alignment and gradient computation.

/// Errors from input validation, context handling, and backend capacity.
///
/// Every variant is detected before any accumulator grid is allocated;
/// a failed call never leaves partial state behind.
#[derive(Debug, thiserror::Error)]
pub enum SoftDtwError {
    /// Returned when the smoothing parameter is zero, negative, NaN, or infinite.
    #[error("gamma must be positive and finite, got {gamma}")]
    InvalidGamma {
        /// The rejected gamma value.
        gamma: f64,
    },

    /// Returned when a batch contains no elements.
    #[error("batch must contain at least one element")]
    EmptyBatch,

    /// Returned when a sequence-length or feature axis has zero extent.
    #[error("{axis} axis must have non-zero length")]
    EmptyAxis {
        /// Name of the offending axis.
        axis: &'static str,
    },

    /// Returned when a flat buffer disagrees with its declared shape.
    #[error("buffer has {len} values, expected {batch}x{rows}x{cols} = {expected}")]
    ShapeMismatch {
        /// Length of the provided buffer.
        len: usize,
        /// Declared batch size.
        batch: usize,
        /// Declared row count per element.
        rows: usize,
        /// Declared column count per element.
        cols: usize,
        /// The product `batch * rows * cols`.
        expected: usize,
    },

    /// Returned when a cost or series buffer contains NaN or infinity.
    #[error("non-finite value at flat index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when two series batches have different batch sizes.
    #[error("batch sizes differ: {x} vs {y}")]
    BatchSizeMismatch {
        /// Batch size of the first operand.
        x: usize,
        /// Batch size of the second operand.
        y: usize,
    },

    /// Returned when two series batches have different feature dimensions.
    #[error("feature dimensions differ: {x} vs {y}")]
    FeatureDimMismatch {
        /// Feature dimension of the first operand.
        x: usize,
        /// Feature dimension of the second operand.
        y: usize,
    },

    /// Returned when the upstream gradient vector does not cover the batch.
    #[error("upstream gradient has {got} values, expected {expected}")]
    UpstreamLengthMismatch {
        /// Length of the provided upstream slice.
        got: usize,
        /// Batch size recorded in the alignment context.
        expected: usize,
    },

    /// Returned when a gradient is requested with engine parameters that
    /// differ from the align call that produced the context.
    #[error(
        "context was produced with gamma={ctx_gamma}, radius={ctx_radius}; \
         engine has gamma={gamma}, radius={radius}"
    )]
    ContextMismatch {
        /// Gamma recorded in the context.
        ctx_gamma: f64,
        /// Band radius recorded in the context (0 = unconstrained).
        ctx_radius: usize,
        /// Gamma configured on the engine.
        gamma: f64,
        /// Band radius configured on the engine.
        radius: usize,
    },

    /// Returned when the parallel backend cannot cover an anti-diagonal:
    /// the wavefront width `max(N, M)` exceeds the per-element worker limit.
    /// Callers may catch this and retry on the sequential backend.
    #[error("wavefront width {width} exceeds parallel backend limit {limit}")]
    CapacityExceeded {
        /// Required wavefront width, `max(N, M)`.
        width: usize,
        /// Maximum width the parallel backend supports.
        limit: usize,
    },
}
