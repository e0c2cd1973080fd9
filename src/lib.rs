//! Batched differentiable soft-DTW alignment.
//!
//! Pure math library, no I/O. Computes the soft-minimum accumulated
//! alignment cost between pairs of variable-length sequences from a
//! caller-supplied batch of pairwise cost matrices, together with the exact
//! gradient of each value with respect to every cost entry. Supports
//! Sakoe-Chiba band pruning, unequal sequence lengths, the debiased
//! divergence composition, and a choice of sequential or wavefront-parallel
//! execution.
//!
//! ```
//! use softdtw::{Backend, CostBatch, SoftDtw};
//!
//! let cost = CostBatch::new(vec![0.0, 1.0, 1.0, 0.0], 1, 2, 2)?;
//! let engine = SoftDtw::new(0.1)?.with_backend(Backend::Sequential);
//! let alignment = engine.align(&cost)?;
//! let grads = engine.gradient(&alignment, &[1.0])?;
//! assert_eq!(grads.batch_len(), 1);
//! # Ok::<(), softdtw::SoftDtwError>(())
//! ```

mod backward;
mod band;
mod cost;
mod engine;
mod error;
mod forward;
mod grid;
mod metric;
mod schedule;
mod series;

pub use band::BandConstraint;
pub use cost::{CostBatch, GradientBatch};
pub use engine::{Alignment, Divergence, DivergenceGradient, SoftDtw};
pub use error::SoftDtwError;
pub use metric::{CostMetric, RbfCost, SquaredEuclidean};
pub use schedule::{Backend, MAX_WAVEFRONT_WIDTH};
pub use series::SeriesBatch;
